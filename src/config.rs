use anyhow::{Context, Result};
use figment::{
    providers::Serialized,
    value::{Dict, Map, Value},
    Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Заголовок целевого окна, если в конфигурации он не задан
pub const DEFAULT_TITLE: &str = "Ticket Info";

/// Путь к файлу конфигурации по умолчанию
pub const DEFAULT_CONFIG_PATH: &str = "/etc/window-guard.conf";

const TITLE_KEY: &str = "title";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Подстрока заголовка целевого окна (с учётом регистра)
    pub title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(ConfFile::new(config_path));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        // Пустое значение `title=` равносильно отсутствию ключа
        if config.title.is_empty() {
            warn!("Пустой заголовок в {:?}, используется \"{}\"", config_path, DEFAULT_TITLE);
            config.title = DEFAULT_TITLE.to_string();
        }

        Ok(config)
    }
}

/// Провайдер figment для файла вида `key=value`.
///
/// Распознаётся только строка `title=<значение>`: значение берётся до первого
/// `\r` или `\n`, последняя такая строка побеждает, всё прочее игнорируется.
/// Отсутствующий или нечитаемый файл даёт пустой набор значений.
pub struct ConfFile {
    path: PathBuf,
}

impl ConfFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse_title(contents: &str) -> Option<String> {
        contents
            .split('\n')
            .filter_map(|line| line.strip_prefix("title="))
            .map(|value| value.split('\r').next().unwrap_or_default().to_string())
            .last()
    }
}

impl Provider for ConfFile {
    fn metadata(&self) -> Metadata {
        Metadata::named("window-guard conf file")
    }

    fn data(&self) -> std::result::Result<Map<Profile, Dict>, figment::Error> {
        let mut dict = Dict::new();

        match std::fs::read(&self.path) {
            Ok(bytes) => match Self::parse_title(&String::from_utf8_lossy(&bytes)) {
                Some(title) => {
                    dict.insert(TITLE_KEY.to_string(), Value::from(title));
                }
                None => {
                    warn!(
                        "В {:?} нет ключа '{}', используется \"{}\"",
                        self.path, TITLE_KEY, DEFAULT_TITLE
                    );
                }
            },
            Err(e) => {
                warn!(
                    "⚠️ Не удалось открыть файл конфигурации {:?}: {}. Используется \"{}\"",
                    self.path, e, DEFAULT_TITLE
                );
            }
        }

        Ok(Profile::Default.collect(dict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_conf(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_default_title() {
        let config = Config::load("/nonexistent/window-guard.conf").unwrap();
        assert_eq!(config.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_title_is_read() {
        let file = write_conf("title=Order Details\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.title, "Order Details");
    }

    #[test]
    fn test_last_title_wins_and_unknown_lines_ignored() {
        let file = write_conf("# comment\ntitle=First\ncolor=red\ntitle=Second\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.title, "Second");
    }

    #[test]
    fn test_crlf_is_trimmed_but_spaces_are_kept() {
        let file = write_conf("title= Ticket Info \r\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.title, " Ticket Info ");
    }

    #[test]
    fn test_missing_key_or_empty_value_uses_default() {
        let file = write_conf("name=whatever\n");
        assert_eq!(Config::load(file.path()).unwrap().title, DEFAULT_TITLE);

        let file = write_conf("title=\n");
        assert_eq!(Config::load(file.path()).unwrap().title, DEFAULT_TITLE);
    }

    #[test]
    fn test_key_must_start_the_line() {
        assert_eq!(ConfFile::parse_title("  title=Indented\n"), None);
        assert_eq!(
            ConfFile::parse_title("title=Last line without newline"),
            Some("Last line without newline".to_string())
        );
    }
}
