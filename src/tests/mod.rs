use crate::output::Output;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::io;
use std::io::Write;
use std::sync::Arc;


/// Output keeping every file in memory, keyed by location key.
#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryOutput {
    files: Arc<Mutex<IndexMap<String, Vec<u8>>>>,
}

impl MemoryOutput {
    pub(crate) fn file(&self, location_key: &str) -> Option<String> {
        self.files
            .lock()
            .get(location_key)
            .map(|contents| String::from_utf8_lossy(contents).into_owned())
    }

    pub(crate) fn location_keys(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }
}

struct MemoryWriter {
    location_key: String,
    files: Arc<Mutex<IndexMap<String, Vec<u8>>>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.files
            .lock()
            .entry(self.location_key.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Output for MemoryOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        self.files
            .lock()
            .insert(location_key.to_string(), Vec::new());
        Ok(MemoryWriter {
            location_key: location_key.to_string(),
            files: self.files.clone(),
        })
    }
}
