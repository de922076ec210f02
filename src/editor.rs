use super::*;
use crate::config::EditorConfig;
use crate::plan::Session;
use std::fs;
use std::path::Path;

/// Serialized plan ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub content: String,
}

/// Owns the loaded plan, if any. Loading a new file replaces the session
/// wholesale; a load that fails leaves the current one in place.
#[derive(Debug, Clone, Default)]
pub struct PlanEditor {
    config: EditorConfig,
    session: Option<Session>,
}

impl PlanEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EditorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            session: None,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    fn check_size(&self, size: u64) -> Result<()> {
        let limit = self.config.max_input_bytes;
        if size > limit {
            tracing::warn!(size, limit, "test plan rejected: too large");
            return Err(Error::InputTooLarge { size, limit });
        }
        Ok(())
    }

    pub fn load_str(&mut self, xml: &str) -> Result<&mut Session> {
        self.check_size(xml.len() as u64)?;
        let session = match Session::parse_with_config(xml, &self.config) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "test plan failed to load");
                return Err(err);
            }
        };
        tracing::info!(
            thread_groups = session.thread_groups().len(),
            samplers = session.samplers().len(),
            timers = session.timers().len(),
            data_sources = session.data_sources().len(),
            variables = session.variables().len(),
            "test plan loaded"
        );
        Ok(self.session.insert(session))
    }

    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&mut Session> {
        self.check_size(bytes.len() as u64)?;
        let xml = std::str::from_utf8(bytes).map_err(|err| {
            tracing::warn!(error = %err, "test plan is not UTF-8");
            Error::XmlParse(format!("input is not valid UTF-8: {err}"))
        })?;
        self.load_str(xml)
    }

    /// Reads and loads a plan file. The size limit is checked before the file
    /// is read.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Session> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.check_size(size)?;
        let bytes = fs::read(path)?;
        tracing::debug!(path = %path.display(), size, "reading test plan");
        self.load_bytes(&bytes)
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NoPlanLoaded)
    }

    pub fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(Error::NoPlanLoaded)
    }

    /// Drops the loaded plan and returns it.
    pub fn close(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub fn export(&self) -> Result<Export> {
        let session = self.session()?;
        Ok(Export {
            filename: self.config.download_filename.clone(),
            content: session.to_xml_string(),
        })
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let export = self.export()?;
        fs::write(path.as_ref(), export.content)?;
        tracing::info!(path = %path.as_ref().display(), "test plan exported");
        Ok(())
    }
}
