use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use log::{error, info};

/// Station id to display name, e.g. the brand shown on the forecourt.
#[derive(Debug, Clone, Default)]
pub struct StationNames {
    names: HashMap<String, String>,
}

impl StationNames {
    /// Reads a JSON object of `{"station id": "name"}`. A missing or broken
    /// file leaves the directory empty.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let names = File::open(path)
            .map_err(|err| err.to_string())
            .and_then(|file| {
                serde_json::from_reader::<_, HashMap<String, String>>(BufReader::new(file))
                    .map_err(|err| err.to_string())
            });

        match names {
            Ok(names) => {
                info!("loaded {} station names from {}", names.len(), path.display());
                Self { names }
            }
            Err(err) => {
                error!("failed to load station names from {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for StationNames {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
