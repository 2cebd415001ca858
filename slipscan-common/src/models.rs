//! Extraction result data model
//!
//! Mirrors the JSON exchanged with the extraction backend. Every field is
//! optional and unknown keys are kept in `extra`, so a result survives a
//! round trip through the client and back into an export request unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// MIME type of the spreadsheet returned by the export endpoint
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Suggested download name for the exported spreadsheet
pub const EXPORT_FILENAME: &str = "extraccion_comprobantes.xlsx";

/// Content-Disposition header value sent with the exported spreadsheet
pub const EXPORT_CONTENT_DISPOSITION: &str = "attachment; filename=extraccion_comprobantes.xlsx";

/// Outcome for one uploaded image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResultRepr")]
pub struct ExtractionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Backend keys this crate does not interpret (`texto_raw`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire form of [`ExtractionResult`]
///
/// The record is decoded separately so a malformed one costs only its own
/// fields, not the whole result set.
#[derive(Deserialize)]
struct ResultRepr {
    #[serde(default, deserialize_with = "de_opt_text")]
    filename: Option<String>,
    #[serde(default)]
    extracted_data: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_text")]
    error: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ResultRepr> for ExtractionResult {
    fn from(mut repr: ResultRepr) -> Self {
        // Older backends send the record under `datos`; `extracted_data` wins
        let record = match repr.extracted_data.take() {
            Some(value) => Some(("extracted_data", value)),
            None => repr.extra.remove("datos").map(|value| ("datos", value)),
        };

        let extracted_data = match record {
            None | Some((_, Value::Null)) => None,
            Some((key, value)) => match serde_json::from_value(value.clone()) {
                Ok(data) => Some(data),
                Err(e) => {
                    debug!(key, error = %e, "Keeping undecodable extraction record as raw JSON");
                    repr.extra.insert(key.to_string(), value);
                    None
                }
            },
        };

        Self {
            filename: repr.filename,
            extracted_data,
            error: repr.error,
            extra: repr.extra,
        }
    }
}

impl ExtractionResult {
    /// Build a result from the `/extract` response for a single file
    ///
    /// The single-file endpoint may answer with a full result object or with
    /// the bare field record; both are accepted. The uploaded filename fills
    /// in when the backend omits it.
    pub fn from_single_response(value: Value, filename: &str) -> crate::Result<Self> {
        let mut result: ExtractionResult = serde_json::from_value(value.clone())?;
        let bare = result.extracted_data.is_none()
            && result.error.is_none()
            && !result.extra.contains_key("extracted_data")
            && !result.extra.contains_key("datos");
        if bare {
            let data: ExtractedData = serde_json::from_value(value)?;
            result = ExtractionResult {
                extracted_data: Some(data),
                ..Default::default()
            };
        }
        if result.filename.is_none() {
            result.filename = Some(filename.to_string());
        }
        Ok(result)
    }

    /// Error message reported for this image, top-level or nested
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.extracted_data.as_ref()?.error.as_deref())
            .filter(|msg| !msg.trim().is_empty())
    }
}

/// Structured record of fields extracted from a transfer slip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remitente: Option<Party>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinatario: Option<Party>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub banco_origen_app: Option<String>,

    /// Raw amount: a number or a formatted string such as `"$ 1.234"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monto: Option<Value>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub hora: Option<String>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub codigo_transaccion: Option<String>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub asunto: Option<String>,

    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sender or recipient of a transfer
///
/// Accepts either a detail object or a bare name string. Any other shape
/// decodes as an empty party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartyRepr")]
pub struct Party {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PartyRepr {
    Name(String),
    Details {
        #[serde(default, deserialize_with = "de_opt_text")]
        nombre: Option<String>,
        #[serde(default, deserialize_with = "de_opt_text")]
        banco: Option<String>,
        #[serde(default, deserialize_with = "de_opt_text")]
        rut: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Other(Value),
}

impl From<PartyRepr> for Party {
    fn from(repr: PartyRepr) -> Self {
        match repr {
            PartyRepr::Name(nombre) => Party {
                nombre: Some(nombre),
                ..Default::default()
            },
            PartyRepr::Details {
                nombre,
                banco,
                rut,
                extra,
            } => Party {
                nombre,
                banco,
                rut,
                extra,
            },
            PartyRepr::Other(_) => Party::default(),
        }
    }
}

/// Error recorded for an upload the backend returned no result for
pub const MISSING_RESULT: &str = "No result returned for this file";

/// `{ "results": [...] }` envelope
///
/// Shape of both the multi-file extraction response and the export request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub results: Vec<ExtractionResult>,
}

impl ResultSet {
    pub fn new(results: Vec<ExtractionResult>) -> Self {
        Self { results }
    }

    /// Results reordered to follow `filenames`
    ///
    /// Matching is by `filename`, never by array position; duplicate names
    /// match in order of appearance. Inputs with no matching result get an
    /// error entry; results whose filename matches no input are kept, in
    /// backend order, at the end.
    pub fn align(self, filenames: &[String]) -> Vec<ExtractionResult> {
        let mut remaining: Vec<Option<ExtractionResult>> =
            self.results.into_iter().map(Some).collect();
        let mut aligned = Vec::with_capacity(filenames.len().max(remaining.len()));

        for name in filenames {
            let position = remaining.iter().position(|slot| {
                slot.as_ref()
                    .is_some_and(|r| r.filename.as_deref() == Some(name.as_str()))
            });
            match position.and_then(|i| remaining[i].take()) {
                Some(result) => aligned.push(result),
                None => aligned.push(ExtractionResult {
                    filename: Some(name.clone()),
                    error: Some(MISSING_RESULT.to_string()),
                    ..Default::default()
                }),
            }
        }

        aligned.extend(remaining.into_iter().flatten());
        aligned
    }
}

/// Accept strings, numbers and booleans as text; `null` becomes `None`
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
