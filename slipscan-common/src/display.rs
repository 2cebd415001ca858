//! Result flattening and currency formatting for display
//!
//! Turns an [`ExtractionResult`] into one table row. Absent fields become
//! `None` (rendered as a dash); nothing here panics on missing data.

use serde::Serialize;
use serde_json::Value;

use crate::models::{ExtractionResult, Party};

/// Placeholder shown for absent values
pub const PLACEHOLDER: &str = "-";

/// Filename shown when the backend returned none
pub const UNKNOWN_FILENAME: &str = "Desconocido";

/// One flattened results-table row
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayRow {
    pub filename: String,
    pub error: Option<String>,
    /// Date and time joined with a space
    pub fecha: Option<String>,
    pub origen: Option<String>,
    pub destino: Option<String>,
    pub asunto: Option<String>,
    pub monto: Option<i64>,
    pub estado: Option<String>,
    pub codigo: Option<String>,
}

impl DisplayRow {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub fn flatten_result(result: &ExtractionResult) -> DisplayRow {
    let filename = non_empty(result.filename.as_deref())
        .unwrap_or(UNKNOWN_FILENAME)
        .to_string();

    if let Some(message) = result.error_message() {
        return DisplayRow {
            filename,
            error: Some(message.to_string()),
            ..Default::default()
        };
    }

    let Some(data) = result.extracted_data.as_ref() else {
        return DisplayRow {
            filename,
            ..Default::default()
        };
    };

    let fecha = format!(
        "{} {}",
        data.fecha.as_deref().unwrap_or_default(),
        data.hora.as_deref().unwrap_or_default()
    );

    let remitente = data.remitente.as_ref();
    let destinatario = data.destinatario.as_ref();

    DisplayRow {
        filename,
        error: None,
        fecha: non_empty(Some(fecha.trim())).map(str::to_string),
        origen: first_non_empty(&[
            party_field(remitente, |p| &p.nombre),
            data.banco_origen_app.as_deref(),
            party_field(remitente, |p| &p.banco),
            party_field(remitente, |p| &p.rut),
        ]),
        destino: first_non_empty(&[
            party_field(destinatario, |p| &p.nombre),
            party_field(destinatario, |p| &p.banco),
            party_field(destinatario, |p| &p.rut),
        ]),
        asunto: owned(data.asunto.as_deref()),
        monto: data.monto.as_ref().and_then(parse_amount),
        estado: owned(data.estado.as_deref()),
        codigo: owned(data.codigo_transaccion.as_deref()),
    }
}

fn party_field<'a>(
    party: Option<&'a Party>,
    field: impl Fn(&'a Party) -> &'a Option<String>,
) -> Option<&'a str> {
    party.and_then(|p| field(p).as_deref())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn owned(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

fn first_non_empty(candidates: &[Option<&str>]) -> Option<String> {
    candidates.iter().find_map(|c| owned(*c))
}

/// Parse an amount given as a JSON number or a formatted string
///
/// Strings follow Chilean conventions: `.` groups thousands and `,` starts
/// the decimals, which are dropped (`"$ 1.234.567,50"` → 1234567).
pub fn parse_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let integer_part = s.split(',').next().unwrap_or_default();
            let digits: String = integer_part.chars().filter(char::is_ascii_digit).collect();
            if digits.is_empty() {
                return None;
            }
            let amount = digits.parse::<i64>().ok()?;
            let negative = integer_part
                .chars()
                .take_while(|c| !c.is_ascii_digit())
                .any(|c| c == '-');
            Some(if negative { -amount } else { amount })
        }
        _ => None,
    }
}

/// Format a peso amount with `.` thousands grouping and no decimals
///
/// `Some(1234567)` → `"$ 1.234.567"`, `None` → `"-"`.
pub fn format_clp(amount: Option<i64>) -> String {
    let Some(amount) = amount else {
        return PLACEHOLDER.to_string();
    };

    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-$ {}", grouped)
    } else {
        format!("$ {}", grouped)
    }
}
