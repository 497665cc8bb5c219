use std::path::PathBuf;

use crate::utils::errors::AppError;

/// Runtime settings, read from the environment after `.env` is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub proxy_url: String,
    pub vs: String,
    pub per_page: u32,
    /// `None` disables PNG export
    pub chart_path: Option<PathBuf>,
    pub theme_file: PathBuf,
    /// Native raster size of the chart surface
    pub chart_size: (u32, u32),
    /// Size the chart is displayed at, in CSS pixels
    pub display_size: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: "http://127.0.0.1:8061".to_string(),
            vs: "usd".to_string(),
            per_page: 50,
            chart_path: Some(PathBuf::from("chart.png")),
            theme_file: PathBuf::from(".coinboard_theme"),
            chart_size: (900, 360),
            display_size: (900.0, 360.0),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("COINBOARD_PROXY_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(AppError::Config("COINBOARD_PROXY_URL is empty".to_string()));
            }
            config.proxy_url = url.to_string();
        }

        if let Some(vs) = lookup("COINBOARD_VS") {
            let vs = vs.trim().to_lowercase();
            if vs.is_empty() {
                return Err(AppError::Config("COINBOARD_VS is empty".to_string()));
            }
            config.vs = vs;
        }

        if let Some(per_page) = lookup("COINBOARD_PER_PAGE") {
            config.per_page = per_page.trim().parse().map_err(|_| {
                AppError::Config(format!("COINBOARD_PER_PAGE must be a number, got '{}'", per_page))
            })?;
        }

        if let Some(path) = lookup("COINBOARD_CHART_PATH") {
            let path = path.trim();
            config.chart_path = if path.is_empty() { None } else { Some(PathBuf::from(path)) };
        }

        if let Some(path) = lookup("COINBOARD_THEME_FILE") {
            config.theme_file = PathBuf::from(path.trim());
        }

        if let Some(size) = lookup("COINBOARD_CHART_SIZE") {
            config.chart_size = parse_size("COINBOARD_CHART_SIZE", &size)?;
        }

        if let Some(size) = lookup("COINBOARD_DISPLAY_SIZE") {
            let (w, h) = parse_size("COINBOARD_DISPLAY_SIZE", &size)?;
            config.display_size = (w as f64, h as f64);
        }

        Ok(config)
    }
}

/// `WIDTHxHEIGHT`, both positive
fn parse_size(key: &str, value: &str) -> Result<(u32, u32), AppError> {
    let invalid = || AppError::Config(format!("{} must look like 900x360, got '{}'", key, value));

    let (w, h) = value.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}
