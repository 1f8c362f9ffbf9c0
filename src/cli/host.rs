//! Page snapshot I/O and the scripted host behaviour used by `--emulate-host`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use host_dom::{DomEvent, DomEventKind, Document, HostPage, HostScript, PageSnapshot};
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, warn};

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub async fn load_page(path: &Path, emulate_host: bool) -> Result<Arc<HostPage>> {
    let snapshot: PageSnapshot = read_json(path).await?;
    let mut doc = Document::from_snapshot(&snapshot)
        .with_context(|| format!("building page from {}", path.display()))?;
    if emulate_host {
        doc.install_script(Arc::new(UploadHandler));
    }
    Ok(HostPage::new(doc))
}

pub async fn write_page(page: &HostPage, path: &Path) -> Result<()> {
    let snapshot = page.snapshot();
    let serialized = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, serialized)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote filled page to {}", path.display());
    Ok(())
}

/// Stands in for the host's own upload script: on `change` of a file
/// input it records the file name in a hidden `receipt_file` field and any
/// filename label.
pub struct UploadHandler;

impl UploadHandler {
    const FIELD_NAME: &'static str = "receipt_file";

    fn record_upload(&self, doc: &mut Document, name: &str) -> Result<(), host_dom::DomError> {
        let field = doc
            .query_selector(&format!("input[name=\"{}\"]", Self::FIELD_NAME))?;
        let field = match field {
            Some(field) => field,
            None => {
                let field = doc.create_element("input");
                doc.set_attr(field, "type", "hidden")?;
                doc.set_attr(field, "name", Self::FIELD_NAME)?;
                let body = doc.body();
                doc.append_child(body, field)?;
                field
            }
        };
        doc.set_value(field, name)?;
        for label in doc.query_selector_all(".file-name, .upload-filename")? {
            doc.set_text(label, name)?;
        }
        Ok(())
    }
}

impl HostScript for UploadHandler {
    fn name(&self) -> &str {
        "upload-handler"
    }

    fn on_event(&self, doc: &mut Document, event: &DomEvent) {
        if event.kind != DomEventKind::Change {
            return;
        }
        let Some(name) = doc
            .element(event.target)
            .filter(|el| el.input_type().as_deref() == Some("file"))
            .and_then(|el| el.files().first())
            .map(|file| file.name.clone())
        else {
            return;
        };
        match self.record_upload(doc, &name) {
            Ok(()) => debug!(file = %name, "host recorded upload"),
            Err(err) => warn!(error = %err, "host upload handler failed"),
        }
    }
}
