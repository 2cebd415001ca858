use slipscan_common::display::{flatten_result, format_clp, DisplayRow, PLACEHOLDER};
use slipscan_common::ExtractionResult;

const HEADERS: [&str; 8] = [
    "Archivo",
    "Fecha y Hora",
    "Origen",
    "Destino",
    "Asunto",
    "Monto",
    "Estado",
    "Código",
];

/// Render results as an aligned text table, one row per image
pub fn render(results: &[ExtractionResult]) -> String {
    let rows: Vec<[String; 8]> = results
        .iter()
        .map(flatten_result)
        .map(|row| cells(&row))
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(rule.join("  ").trim_end());
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

/// One-line summary: how many images succeeded and failed
pub fn summary(results: &[ExtractionResult]) -> String {
    let failed = results
        .iter()
        .filter(|r| r.error_message().is_some())
        .count();
    format!(
        "{} image(s) processed, {} ok, {} with errors",
        results.len(),
        results.len() - failed,
        failed
    )
}

fn cells(row: &DisplayRow) -> [String; 8] {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| PLACEHOLDER.to_string());

    if let Some(error) = &row.error {
        let mut cells = [(); 8].map(|_| PLACEHOLDER.to_string());
        cells[0] = row.filename.clone();
        cells[1] = format!("Error: {}", error);
        return cells;
    }

    [
        row.filename.clone(),
        text(&row.fecha),
        text(&row.origen),
        text(&row.destino),
        text(&row.asunto),
        format_clp(row.monto),
        text(&row.estado),
        text(&row.codigo),
    ]
}

fn push_line(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results() -> Vec<ExtractionResult> {
        serde_json::from_value(json!([
            {
                "filename": "a.jpg",
                "extracted_data": {
                    "remitente": {"nombre": "Ana"},
                    "destinatario": {"nombre": "Comercial Sur"},
                    "monto": 1234567,
                    "fecha": "02/05/2024",
                    "hora": "09:15:00",
                    "estado": "Exitosa"
                }
            },
            {"filename": "b.jpg", "error": "OCR timeout"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_table_contains_formatted_rows() {
        let table = render(&results());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Archivo"));
        assert!(lines[1].starts_with("-------"));
        assert!(lines[2].contains("$ 1.234.567"));
        assert!(lines[2].contains("02/05/2024 09:15:00"));
        assert!(lines[2].contains("Comercial Sur"));
        assert!(lines[3].contains("Error: OCR timeout"));
    }

    #[test]
    fn test_columns_align() {
        let table = render(&results());
        let lines: Vec<&str> = table.lines().collect();
        let header_col = lines[0].find("Fecha y Hora").unwrap();
        let row_col = lines[2].find("02/05/2024").unwrap();
        assert_eq!(header_col, row_col);
    }

    #[test]
    fn test_missing_amount_uses_placeholder() {
        let results: Vec<ExtractionResult> =
            serde_json::from_value(json!([{"filename": "c.jpg", "extracted_data": {}}])).unwrap();
        let table = render(&results);
        let row = table.lines().nth(2).unwrap();
        assert!(row.starts_with("c.jpg"));
        assert!(row.contains(" - "));
    }

    #[test]
    fn test_summary_counts_errors() {
        assert_eq!(summary(&results()), "2 image(s) processed, 1 ok, 1 with errors");
    }
}
