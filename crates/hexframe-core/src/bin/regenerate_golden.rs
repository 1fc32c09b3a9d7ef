use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hexframe_core::{Parser, ProtocolDefinition};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let protocol = path.join("protocol.json");
        let input = path.join("input.hex");
        if !protocol.exists() || !input.exists() {
            continue;
        }
        regenerate_one(&protocol, &input, &path.join("expected_result.json"))?;
    }

    Ok(())
}

fn regenerate_one(protocol: &Path, input: &Path, output: &Path) -> Result<(), String> {
    let text = fs::read_to_string(protocol)
        .map_err(|err| format!("failed to read {}: {}", protocol.display(), err))?;
    let definition = ProtocolDefinition::from_json_str(&text)
        .map_err(|err| format!("invalid protocol {}: {}", protocol.display(), err))?;
    let hex = fs::read_to_string(input)
        .map_err(|err| format!("failed to read {}: {}", input.display(), err))?;

    let result = Parser::new(definition).parse(&hex);
    let mut json = serde_json::to_string_pretty(&result)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    json.push('\n');
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
