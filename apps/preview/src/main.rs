//! Stepform step form preview.

#![forbid(unsafe_code)]

mod preview_config;

use std::path::Path;
use std::sync::Arc;

use stepform_application::{FormEditorService, FormViewService, StepViewRequest};
use stepform_core::{AppError, AppResult};
use stepform_domain::FormConfigCommand;
use stepform_infrastructure::JsonFileConfigurationStore;
use tracing::{info, warn};

use crate::preview_config::{PreviewConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = PreviewConfig::load()?;
    let store = Arc::new(JsonFileConfigurationStore::new(config.config_dir.clone()));
    let requirement_type = config.requirement_type.as_str();

    info!(
        config_dir = %store.root().display(),
        requirement_type,
        "starting stepform preview"
    );

    if let Some(commands_file) = config.commands_file.as_deref() {
        let commands = read_commands(commands_file).await?;
        let edited = FormEditorService::new(store.clone())
            .apply_commands(requirement_type, commands)
            .await?;
        info!(
            form_id = edited.id(),
            version = edited.version(),
            "applied form commands"
        );
    }

    let service = FormViewService::new(store.clone(), store);
    let snapshot = service.load_snapshot(requirement_type).await?;

    for lint in snapshot.lints() {
        warn!(requirement_type, lint = ?lint, "form configuration lint");
    }

    let request = StepViewRequest {
        step_id: config.step_id.clone(),
        viewer: config.viewer_roles.clone(),
        light_mode: config.light_mode,
        include_hidden: config.include_hidden,
    };
    let view = snapshot.step_view(&request)?;

    print_json("outline", &snapshot.outline())?;
    print_json("step", &view)?;

    Ok(())
}

async fn read_commands(path: &Path) -> AppResult<Vec<FormConfigCommand>> {
    let contents = tokio::fs::read(path).await.map_err(|error| {
        AppError::Internal(format!("failed to read '{}': {error}", path.display()))
    })?;

    serde_json::from_slice(&contents).map_err(|error| {
        AppError::Validation(format!("invalid commands in '{}': {error}", path.display()))
    })
}

fn print_json(label: &str, value: &impl serde::Serialize) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render {label}: {error}")))?;
    println!("{rendered}");
    Ok(())
}
