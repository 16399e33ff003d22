use crate::cli::OutputFormat;
use serde_json::json;
use ship::error::get_error_info;
use ship::ShipError;

pub fn emit_output(output: OutputFormat, command: &str, payload: &serde_json::Value) {
    match output {
        OutputFormat::Text => payload
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| println!("{payload}"), |msg| println!("{msg}")),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "command": command,
                "status": "ok",
                "payload": payload,
            })
        ),
    }
}

/// Errors always go to stderr so stdout stays parseable.
pub fn emit_error(output: OutputFormat, command: &str, error: &ShipError) {
    let fix = get_error_info(error.code()).map(|(_, fix)| fix);
    match output {
        OutputFormat::Text => {
            eprintln!("error[{}]: {}", error.code(), error);
            if let Some(fix) = fix {
                eprintln!("  fix: {fix}");
            }
        }
        OutputFormat::Json => eprintln!("{}", error_envelope(command, error)),
    }
}

fn error_envelope(command: &str, error: &ShipError) -> serde_json::Value {
    json!({
        "command": command,
        "status": "error",
        "error": {
            "code": error.code(),
            "message": error.to_string(),
            "fix": get_error_info(error.code()).map(|(_, fix)| fix),
            "exit_code": error.exit_code(),
        },
    })
}
