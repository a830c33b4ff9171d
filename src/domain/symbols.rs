//! Technical drawing symbols and the built-in ABNT catalog.
//!
//! Category wire names follow the JSON schema requested from the model
//! (`eletrico`, `hidraulico`, `arquitetonico`, `estrutural`); English names
//! are accepted on input.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Discipline a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolCategory {
    #[serde(rename = "eletrico", alias = "electrical")]
    Electrical,
    #[serde(rename = "hidraulico", alias = "hydraulic")]
    Hydraulic,
    #[serde(rename = "arquitetonico", alias = "architectural")]
    Architectural,
    #[serde(rename = "estrutural", alias = "structural")]
    Structural,
}

impl SymbolCategory {
    pub const ALL: [SymbolCategory; 4] = [
        Self::Electrical,
        Self::Hydraulic,
        Self::Architectural,
        Self::Structural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electrical => "eletrico",
            Self::Hydraulic => "hidraulico",
            Self::Architectural => "arquitetonico",
            Self::Structural => "estrutural",
        }
    }
}

impl Default for SymbolCategory {
    fn default() -> Self {
        Self::Electrical
    }
}

impl fmt::Display for SymbolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coded glyph or abbreviation used on technical drawings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub name: String,
    pub code: String,
    pub category: SymbolCategory,
    pub description: String,
    pub customizable: bool,
}

/// User input for a new symbol. Unknown fields (such as a client-side `id`)
/// are ignored; missing and `null` fields read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: SymbolCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update for a user symbol.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<SymbolCategory>,
    pub description: Option<String>,
}

impl SymbolPatch {
    pub(crate) fn apply_to(&self, symbol: &mut Symbol) {
        if let Some(name) = &self.name {
            symbol.name = name.clone();
        }
        if let Some(code) = &self.code {
            symbol.code = code.clone();
        }
        if let Some(category) = self.category {
            symbol.category = category;
        }
        if let Some(description) = &self.description {
            symbol.description = description.clone();
        }
    }
}

// =============================================================================
// Built-in catalog
// =============================================================================

fn builtin(id: &str, name: &str, code: &str, category: SymbolCategory, description: &str) -> Symbol {
    Symbol {
        id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        category,
        description: description.to_string(),
        customizable: true,
    }
}

static CATALOG: Lazy<Vec<Symbol>> = Lazy::new(|| {
    use SymbolCategory::*;

    vec![
        // Electrical
        builtin("elec_001", "Tomada Simples", "⏚", Electrical, "Tomada de uso geral 2P+T 127V/220V"),
        builtin("elec_002", "Tomada Dupla", "⏚⏚", Electrical, "Tomada dupla 2P+T"),
        builtin("elec_003", "Tomada Específica", "⏚E", Electrical, "Tomada para uso específico (geladeira, micro-ondas, etc)"),
        builtin("elec_004", "Interruptor Simples", "S", Electrical, "Interruptor simples de uma seção"),
        builtin("elec_005", "Interruptor Paralelo", "S3", Electrical, "Interruptor three-way (paralelo)"),
        builtin("elec_006", "Interruptor Intermediário", "S4", Electrical, "Interruptor four-way (intermediário)"),
        builtin("elec_007", "Ponto de Luz no Teto", "⊕", Electrical, "Ponto de luz incandescente no teto"),
        builtin("elec_008", "Luminária Fluorescente", "⊞", Electrical, "Luminária fluorescente"),
        builtin("elec_009", "Quadro de Distribuição", "QD", Electrical, "Quadro de distribuição de circuitos"),
        builtin("elec_010", "Ponto de Ar Condicionado", "AC", Electrical, "Ponto elétrico para ar condicionado"),
        // Hydraulic
        builtin("hydr_001", "Ponto de Água Fria", "AF", Hydraulic, "Ponto de alimentação de água fria"),
        builtin("hydr_002", "Ponto de Água Quente", "AQ", Hydraulic, "Ponto de alimentação de água quente"),
        builtin("hydr_003", "Esgoto", "ES", Hydraulic, "Ponto de esgoto sanitário"),
        builtin("hydr_004", "Ventilação", "V", Hydraulic, "Tubo de ventilação"),
        builtin("hydr_005", "Ralo Seco", "RS", Hydraulic, "Ralo seco"),
        builtin("hydr_006", "Ralo Sifonado", "RSi", Hydraulic, "Ralo sifonado"),
        builtin("hydr_007", "Chuveiro", "CH", Hydraulic, "Ponto de chuveiro"),
        builtin("hydr_008", "Vaso Sanitário", "VS", Hydraulic, "Vaso sanitário"),
        builtin("hydr_009", "Lavatório", "L", Hydraulic, "Lavatório"),
        builtin("hydr_010", "Tanque", "TQ", Hydraulic, "Tanque de lavar roupa"),
        // Architectural
        builtin("arch_001", "Parede", "PAR", Architectural, "Parede de alvenaria"),
        builtin("arch_002", "Porta", "P", Architectural, "Porta de abrir"),
        builtin("arch_003", "Janela", "J", Architectural, "Janela"),
        builtin("arch_004", "Escada", "ESC", Architectural, "Escada"),
        builtin("arch_005", "Pilar", "PIL", Architectural, "Pilar arquitetônico"),
        // Structural
        builtin("stru_001", "Pilar", "P", Structural, "Pilar estrutural"),
        builtin("stru_002", "Viga", "V", Structural, "Viga estrutural"),
        builtin("stru_003", "Laje", "L", Structural, "Laje"),
    ]
});

/// Read-only view over the built-in symbols.
pub mod catalog {
    use super::{Symbol, SymbolCategory, CATALOG};

    pub fn all() -> &'static [Symbol] {
        CATALOG.as_slice()
    }

    pub fn by_category(category: SymbolCategory) -> impl Iterator<Item = &'static Symbol> {
        all().iter().filter(move |s| s.category == category)
    }

    pub fn by_id(id: &str) -> Option<&'static Symbol> {
        all().iter().find(|s| s.id == id)
    }
}
