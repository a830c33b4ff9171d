//! Text heuristics for drawings.
//!
//! These helpers work on extracted PDF text. They never replace the model's
//! answer: project type, scale and room guesses are passed to the prompt as
//! hints, and the consistency review only feeds the logs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{ProjectType, ReportDigest, Scale, ScaleMethod};

/// Ordered keyword rules. The first rule with a hit wins.
const PROJECT_TYPE_RULES: &[(ProjectType, &[&str], &str)] = &[
    (
        ProjectType::Eletrico,
        &["elétric", "eletric", "quadro de distribuição", "circuito", "tomada", "interruptor"],
        "eletric",
    ),
    (
        ProjectType::Hidraulico,
        &["hidráulic", "hidraulic", "água fria", "água quente", "esgoto", "tubulação"],
        "hidraulic",
    ),
    (ProjectType::Sanitario, &["sanitári", "sanitari"], "sanit"),
    (
        ProjectType::Estrutural,
        &["estrutural", "pilar", "viga", "laje", "fundação"],
        "estrut",
    ),
    (ProjectType::Ppci, &["ppci", "incêndio", "incendio", "prevenção"], "ppci"),
    (
        ProjectType::Arquitetonico,
        &["arquitetônic", "arquitetonic", "planta baixa", "layout"],
        "arq",
    ),
];

const ROOM_RULES: &[(&str, &[&str])] = &[
    ("Sala", &["sala", "living"]),
    ("Cozinha", &["cozinha", "coz."]),
    ("Quarto", &["quarto", "dormitório", "dorm.", "suíte", "suite"]),
    ("Banheiro", &["banheiro", "wc", "bwc", "lavabo"]),
    ("Área de Serviço", &["área de serviço", "a.serviço", "serviço"]),
    ("Garagem", &["garagem", "gar."]),
    ("Varanda", &["varanda", "sacada"]),
    ("Corredor", &["corredor", "circulação", "hall"]),
    ("Escritório", &["escritório", "home office"]),
    ("Despensa", &["despensa"]),
];

// `ESCALA 1:50`, `Esc. 1/100`, `1 : 75`
static SCALE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\besc(?:ala)?\.?[:\s]*)?\b1\s*[:/]\s*(\d{1,5})\b")
        .expect("scale pattern is valid")
});

/// Guesses the discipline of a drawing from its text and file name.
pub fn detect_project_type(text: &str, file_name: &str) -> ProjectType {
    let text = text.to_lowercase();
    let file_name = file_name.to_lowercase();

    PROJECT_TYPE_RULES
        .iter()
        .find(|(_, keywords, name_hint)| {
            keywords.iter().any(|k| text.contains(k)) || file_name.contains(name_hint)
        })
        .map(|(project_type, _, _)| *project_type)
        .unwrap_or(ProjectType::Desconhecido)
}

/// Finds a `1:N` scale annotation. Falls back to an undetected 1:100.
pub fn extract_scale(text: &str) -> Scale {
    SCALE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|ratio| *ratio > 0)
        .map(|ratio| Scale::new(f64::from(ratio), true, ScaleMethod::Ocr))
        .unwrap_or_else(|| Scale::new(100.0, false, ScaleMethod::Manual))
}

/// Canonical names of the rooms whose labels appear in `text`, in rule order.
pub fn rooms_mentioned(text: &str) -> Vec<&'static str> {
    let text = text.to_lowercase();

    ROOM_RULES
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| text.contains(p)))
        .map(|(room, _)| *room)
        .collect()
}

/// Points in a report that a reviewer should double-check.
pub fn review_consistency(digest: &ReportDigest) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if !digest.scale_detected() {
        issues.push("Escala não detectada automaticamente - verificar manualmente");
    }
    if digest.project_type == ProjectType::Desconhecido {
        issues.push("Tipo de projeto não identificado - classificar manualmente");
    }
    if digest.symbols == 0 {
        issues.push("Nenhum símbolo detectado - verificar legenda do projeto");
    }
    if digest.areas == 0 {
        issues.push("Áreas não calculadas - verificar cotas e dimensões");
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_type_follows_rule_priority() {
        assert_eq!(
            detect_project_type("Quadro de distribuição QD-1 e esgoto", ""),
            ProjectType::Eletrico
        );
        assert_eq!(detect_project_type("Tubulação de ÁGUA FRIA", ""), ProjectType::Hidraulico);
        assert_eq!(detect_project_type("Planta de formas - VIGA V1", ""), ProjectType::Estrutural);
        assert_eq!(detect_project_type("Rota de fuga", "ppci_terreo.pdf"), ProjectType::Ppci);
        assert_eq!(detect_project_type("", "ARQ-01.pdf"), ProjectType::Arquitetonico);
        assert_eq!(detect_project_type("memorial", "desenho.pdf"), ProjectType::Desconhecido);
    }

    #[test]
    fn scale_is_extracted_from_annotations() {
        let scale = extract_scale("PLANTA BAIXA - ESCALA 1:50");
        assert!(scale.detected);
        assert_eq!(scale.value, "1:50");
        assert_eq!(scale.ratio, 50.0);
        assert_eq!(scale.method, Some(ScaleMethod::Ocr));

        assert_eq!(extract_scale("esc. 1/100").ratio, 100.0);
        assert_eq!(extract_scale("corte AA 1 : 75").ratio, 75.0);
    }

    #[test]
    fn missing_scale_defaults_to_manual_hundred() {
        let scale = extract_scale("sem escala definida");
        assert!(!scale.detected);
        assert_eq!(scale.value, "1:100");
        assert_eq!(scale.method, Some(ScaleMethod::Manual));
    }

    #[test]
    fn rooms_are_recognized_from_labels() {
        assert_eq!(
            rooms_mentioned("SUÍTE 01 - BWC SOCIAL - COZ."),
            vec!["Cozinha", "Quarto", "Banheiro"]
        );
        assert!(rooms_mentioned("depósito").is_empty());
    }

    #[test]
    fn consistency_review_flags_gaps() {
        let digest = ReportDigest {
            project_type: ProjectType::Desconhecido,
            scale: None,
            symbols: 0,
            areas: 3,
            walls: 0,
            electrical_points: 0,
            hydraulic_points: 0,
            structural_elements: 0,
            observations: 0,
            inconsistencies: 0,
            suggestions: 0,
        };
        let issues = review_consistency(&digest);
        assert_eq!(issues.len(), 3);
        assert!(issues[0].starts_with("Escala"));
    }
}
