use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "dayline";

pub fn resolve_data_dir(cli_dir: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_dir {
		return absolutize(path);
	}

	if let Some(path) = env::var_os("DAYLINE_DATA_DIR") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return absolutize(path);
		}
	}

	default_data_dir()
}

fn default_data_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_DATA_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("share").join(APP_DIR);
	}

	PathBuf::from(".dayline")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}
