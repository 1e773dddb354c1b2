use std::env;
use std::path::PathBuf;

use stepform_core::AppError;
use stepform_domain::ViewerRoles;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub config_dir: PathBuf,
    pub requirement_type: String,
    pub step_id: Option<String>,
    pub viewer_roles: ViewerRoles,
    pub light_mode: bool,
    pub include_hidden: bool,
    pub commands_file: Option<PathBuf>,
}

impl PreviewConfig {
    pub fn load() -> Result<Self, AppError> {
        let config_dir = PathBuf::from(required_non_empty_env("STEPFORM_CONFIG_DIR")?);
        let requirement_type = required_non_empty_env("STEPFORM_REQUIREMENT_TYPE")?;
        let step_id = optional_env("STEPFORM_STEP_ID");
        let viewer_roles = ViewerRoles::parse_list(&required_non_empty_env("STEPFORM_VIEWER_ROLES")?)
            .map_err(|error| AppError::Validation(format!("invalid STEPFORM_VIEWER_ROLES: {error}")))?;
        let light_mode = parse_env_bool("STEPFORM_LIGHT_MODE", false)?;
        let include_hidden = parse_env_bool("STEPFORM_INCLUDE_HIDDEN", false)?;
        let commands_file = optional_env("STEPFORM_COMMANDS_FILE").map(PathBuf::from);

        Ok(Self {
            config_dir,
            requirement_type,
            step_id,
            viewer_roles,
            light_mode,
            include_hidden,
            commands_file,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value.trim().to_owned())
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, AppError> {
    match optional_env(name) {
        None => Ok(default),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(AppError::Validation(format!(
            "{name} must be 'true' or 'false', got '{value}'"
        ))),
    }
}
