//! Analysis prompt construction.
//!
//! Prompts are a pure function of the drawing content and the active symbol
//! legend. The JSON schema the model must answer with lives here so prompt
//! changes can be reviewed and tested in one place.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::domain::{ProjectType, Scale, Symbol};
use crate::services::heuristics;

/// Appended after the kept prefix when PDF text exceeds the budget.
pub const TRUNCATION_MARKER: &str = "...(texto truncado)";

/// Detail level requested for image attachments.
pub const IMAGE_DETAIL: &str = "high";

const ROLE: &str =
    "Você é um analista técnico especializado em projetos de engenharia e arquitetura conforme normas ABNT.";

const INSTRUCTIONS: &str = r#"Analise este projeto técnico e produza um relatório COMPLETO e ESTRUTURADO em JSON cobrindo:

1. IDENTIFICAÇÃO DO PROJETO
   - Tipo de projeto, obrigatoriamente um de: arquitetonico, eletrico, hidraulico, estrutural, sanitario, ppci, desconhecido
   - Escala detectada (ex: 1:50, 1:75, 1:100) com a razão numérica explícita
   - Nome da prancha/projeto, se visível

2. LEGENDA E SÍMBOLOS
   - Liste TODOS os símbolos presentes na legenda
   - Reconheça símbolos no desenho mesmo sem legenda, usando as convenções ABNT e a legenda de referência abaixo
   - Para cada símbolo: código, nome, descrição, categoria e número de ocorrências

3. QUANTITATIVOS DE ÁREA
   - Área total do projeto e área de cada ambiente/cômodo
   - Área útil, área molhada e área de circulação
   - Valores em metros quadrados (m²)

4. QUANTITATIVOS LINEARES
   - Paredes: metragem linear por espessura (ex: 15cm, 20cm)
   - Perímetros dos ambientes

5. PONTOS ELÉTRICOS (se aplicável)
   - Cada ponto com tipo, ambiente, coordenadas aproximadas e circuito
   - Tomadas, interruptores, pontos de luz, quadros, etc.

6. PONTOS HIDRÁULICOS (se aplicável)
   - Cada ponto com tipo, ambiente e diâmetro quando visível
   - Água fria, água quente, esgoto, ralos, etc.

7. ELEMENTOS ESTRUTURAIS (se aplicável)
   - Pilares: dimensões, posição, eixos
   - Vigas: identificação, eixos
   - Lajes: espessura, tipo

8. OBSERVAÇÕES TÉCNICAS
   - Inconsistências encontradas
   - Símbolos sem legenda e informações faltantes
   - Sugestões de melhoria"#;

const SCHEMA_HEAD: &str = r#"{
  "projectType": "arquitetonico|eletrico|hidraulico|estrutural|sanitario|ppci|desconhecido",
  "scale": {
    "detected": true,
    "value": "1:50",
    "ratio": 50
  },
  "projectName": "nome_se_encontrado","#;

const SCHEMA_BODY: &str = r#"
  "symbols": [
    {
      "code": "código",
      "name": "nome",
      "description": "descrição",
      "category": "eletrico|hidraulico|arquitetonico|estrutural",
      "count": 0
    }
  ],
  "areas": [
    {
      "name": "nome_do_ambiente",
      "type": "comodo|total|util|molhada|circulacao",
      "value": 0.0,
      "dimensions": "largura x comprimento"
    }
  ],
  "walls": [
    {
      "thickness": 15,
      "linearMeters": 0.0,
      "location": "descrição"
    }
  ],
  "electricalPoints": [
    {
      "type": "tipo_do_ponto",
      "location": "ambiente",
      "coordinates": "posição_aproximada",
      "circuit": "circuito_se_houver",
      "details": "detalhes_adicionais"
    }
  ],
  "hydraulicPoints": [
    {
      "type": "tipo_do_ponto",
      "location": "ambiente",
      "diameter": 0,
      "details": "detalhes"
    }
  ],
  "structuralElements": [
    {
      "type": "pilar|viga|laje",
      "dimensions": "dimensões",
      "position": "posição",
      "axis": "eixo_se_houver"
    }
  ],
  "observations": ["observação"],
  "inconsistencies": ["inconsistência"],
  "suggestions": ["sugestão"]
}"#;

const RULES: &str = r#"IMPORTANTE:
- Responda SOMENTE com o objeto JSON, sem texto antes ou depois e sem blocos de código
- Seja extremamente detalhado e preciso
- Aplique o conhecimento técnico das normas ABNT
- Quando algo não puder ser identificado, registre em "observations"
- Calcule as áreas a partir da escala detectada
- Identifique TODOS os pontos visíveis no projeto"#;

/// Drawing content handed to the builder.
#[derive(Debug, Clone)]
pub enum PromptInput<'a> {
    /// Text extracted from a PDF.
    PdfText {
        text: &'a str,
        num_pages: usize,
        file_name: &'a str,
    },
    /// Raw image bytes with their declared media type.
    Image { media_type: &'a str, bytes: &'a [u8] },
}

/// Inline image sent alongside the prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub data_url: String,
    pub detail: &'static str,
}

/// Everything the gateway needs to issue one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    pdf_char_budget: usize,
}

impl PromptBuilder {
    pub fn new(pdf_char_budget: usize) -> Self {
        Self { pdf_char_budget }
    }

    pub fn build(&self, input: &PromptInput<'_>, symbols: &[Symbol]) -> AnalysisPrompt {
        match input {
            PromptInput::PdfText {
                text,
                num_pages,
                file_name,
            } => AnalysisPrompt {
                text: self.pdf_prompt(text, *num_pages, file_name, symbols),
                image: None,
            },
            PromptInput::Image { media_type, bytes } => AnalysisPrompt {
                text: image_prompt(symbols),
                image: Some(ImageAttachment {
                    data_url: data_url(media_type, bytes),
                    detail: IMAGE_DETAIL,
                }),
            },
        }
    }

    fn pdf_prompt(&self, text: &str, num_pages: usize, file_name: &str, symbols: &[Symbol]) -> String {
        let excerpt = truncate_text(text, self.pdf_char_budget);
        let hints = text_hints(
            heuristics::detect_project_type(text, file_name),
            &heuristics::extract_scale(text),
            &heuristics::rooms_mentioned(text),
        );

        format!(
            "{ROLE}\n\n\
             Este é um PDF de projeto técnico com {num_pages} página(s).\n\n\
             TEXTO EXTRAÍDO DO PDF:\n{excerpt}\n\n\
             {hints}\n\n\
             {INSTRUCTIONS}\n\n\
             {legend}\n\n\
             Retorne APENAS um objeto JSON válido com esta estrutura:\n\n\
             {SCHEMA_HEAD}\n  \"numPages\": {num_pages},{SCHEMA_BODY}\n\n\
             {RULES}\n\
             - Use o texto extraído para localizar legendas, cotas e anotações",
            legend = legend_section(symbols),
        )
    }
}

fn image_prompt(symbols: &[Symbol]) -> String {
    format!(
        "{ROLE}\n\n\
         A planta/projeto técnico segue em anexo como imagem.\n\n\
         {INSTRUCTIONS}\n\n\
         {legend}\n\n\
         Retorne APENAS um objeto JSON válido com esta estrutura:\n\n\
         {SCHEMA_HEAD}{SCHEMA_BODY}\n\n\
         {RULES}",
        legend = legend_section(symbols),
    )
}

/// Keeps the first `budget` characters, marking the cut when text was dropped.
pub fn truncate_text(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((cut, _)) => format!("{} {}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn text_hints(project_type: ProjectType, scale: &Scale, rooms: &[&str]) -> String {
    let mut lines = vec!["INDÍCIOS AUTOMÁTICOS (confirme no conteúdo, não são definitivos):".to_string()];

    lines.push(match project_type {
        ProjectType::Desconhecido => "- Tipo provável: não identificado pelo texto".to_string(),
        other => format!("- Tipo provável: {} ({})", other.as_str(), other.label()),
    });
    lines.push(if scale.detected {
        format!("- Escala encontrada no texto: {}", scale.value)
    } else {
        "- Escala: nenhuma anotação encontrada no texto".to_string()
    });
    if !rooms.is_empty() {
        lines.push(format!("- Ambientes citados no texto: {}", rooms.join(", ")));
    }

    lines.join("\n")
}

fn legend_section(symbols: &[Symbol]) -> String {
    let mut section = String::from("LEGENDA DE REFERÊNCIA (símbolos padrão e personalizados):");

    if symbols.is_empty() {
        section.push_str("\n- nenhuma");
        return section;
    }

    for symbol in symbols {
        section.push_str(&format!(
            "\n- [{}] {} = {}",
            symbol.category, symbol.code, symbol.name
        ));
        if !symbol.description.is_empty() {
            section.push_str(&format!(": {}", symbol.description));
        }
    }
    section
}

fn data_url(media_type: &str, bytes: &[u8]) -> String {
    let media_type = if media_type.trim().is_empty() {
        "image/png"
    } else {
        media_type
    };
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{catalog, SymbolCategory};

    fn custom_symbol() -> Symbol {
        Symbol {
            id: "custom_1".to_string(),
            name: "Tomada USB".to_string(),
            code: "TUSB".to_string(),
            category: SymbolCategory::Electrical,
            description: "Tomada com carregador USB".to_string(),
            customizable: true,
        }
    }

    fn pdf_input(text: &str) -> PromptInput<'_> {
        PromptInput::PdfText {
            text,
            num_pages: 2,
            file_name: "planta.pdf",
        }
    }

    #[test]
    fn short_pdf_text_is_kept_verbatim() {
        let text = "PLANTA BAIXA\nESCALA 1:50\nSALA 12,5 m²";
        let prompt = PromptBuilder::new(8000).build(&pdf_input(text), &[]);

        assert!(prompt.text.contains(text));
        assert!(!prompt.text.contains(TRUNCATION_MARKER));
        assert!(prompt.text.contains("2 página(s)"));
        assert!(prompt.text.contains("\"numPages\": 2"));
        assert!(prompt.image.is_none());
    }

    #[test]
    fn long_pdf_text_is_cut_at_budget() {
        let text: String = "á".repeat(8000) + "FIM_DO_TEXTO";
        let prompt = PromptBuilder::new(8000).build(&pdf_input(&text), &[]);

        let expected = format!("{} {}", "á".repeat(8000), TRUNCATION_MARKER);
        assert!(prompt.text.contains(&expected));
        assert!(!prompt.text.contains("FIM_DO_TEXTO"));
    }

    #[test]
    fn text_exactly_at_budget_is_not_marked() {
        let text = "x".repeat(10);
        assert_eq!(truncate_text(&text, 10), text);
        assert_eq!(truncate_text(&text, 4), format!("xxxx {}", TRUNCATION_MARKER));
    }

    #[test]
    fn pdf_prompt_lists_text_hints() {
        let prompt = PromptBuilder::new(8000).build(&pdf_input("Quadro de distribuição - ESC 1:25"), &[]);
        assert!(prompt.text.contains("- Tipo provável: eletrico (Elétrico)"));
        assert!(prompt.text.contains("- Escala encontrada no texto: 1:25"));
        assert!(!prompt.text.contains("Ambientes citados"));
    }

    #[test]
    fn pdf_prompt_lists_rooms_found_in_text() {
        let prompt = PromptBuilder::new(8000).build(&pdf_input("SALA DE ESTAR - COZINHA - WC"), &[]);
        assert!(prompt
            .text
            .contains("- Ambientes citados no texto: Sala, Cozinha, Banheiro"));
    }

    #[test]
    fn image_prompt_attaches_data_url_with_high_detail() {
        let bytes = [0x89, b'P', b'N', b'G'];
        let prompt = PromptBuilder::new(8000).build(
            &PromptInput::Image {
                media_type: "image/png",
                bytes: &bytes,
            },
            &[],
        );

        let image = prompt.image.unwrap();
        assert_eq!(image.data_url, "data:image/png;base64,iVBORw==");
        assert_eq!(image.detail, "high");
        assert!(!prompt.text.contains("TEXTO EXTRAÍDO"));
        assert!(!prompt.text.contains("numPages"));
    }

    #[test]
    fn prompt_demands_json_schema_and_lists_legend() {
        let mut symbols = catalog::all().to_vec();
        symbols.push(custom_symbol());
        let prompt = PromptBuilder::new(8000).build(&pdf_input("texto"), &symbols);

        for field in [
            "\"projectType\"",
            "\"scale\"",
            "\"electricalPoints\"",
            "\"hydraulicPoints\"",
            "\"structuralElements\"",
            "\"inconsistencies\"",
        ] {
            assert!(prompt.text.contains(field), "missing {field}");
        }
        assert!(prompt.text.contains("SOMENTE com o objeto JSON"));
        assert!(prompt.text.contains("- [eletrico] QD = Quadro de Distribuição"));
        assert!(prompt.text.contains("- [eletrico] TUSB = Tomada USB: Tomada com carregador USB"));
    }

    #[test]
    fn build_is_deterministic() {
        let builder = PromptBuilder::new(100);
        let symbols = vec![custom_symbol()];
        assert_eq!(
            builder.build(&pdf_input("abc"), &symbols),
            builder.build(&pdf_input("abc"), &symbols)
        );
    }
}
