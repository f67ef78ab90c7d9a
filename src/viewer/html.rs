//! 3Dmol.js scene export
//!
//! [`HtmlSceneCapability`] is a rendering capability for headless hosts.
//! Each viewer instance records the engine calls made on it and can be
//! materialized as a self-contained HTML page that replays them in a
//! browser.

use super::capability::{EngineOptions, RenderingCapability, ViewerInstance};
use super::container::{NodeId, SurfaceNode};
use super::style::Style;
use super::{StructureFormat, ViewerError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Public 3Dmol.js build.
pub const LIBRARY_URL: &str = "https://3dmol.org/build/3Dmol-min.js";

#[derive(Debug, Clone, PartialEq)]
enum Library {
    /// Referenced by `<script src>`.
    Remote(String),
    /// Script text, embedded as a base64 data URI.
    Inline(String),
}

/// Capability producing 3Dmol.js scenes as HTML documents.
pub struct HtmlSceneCapability {
    library: Library,
    scenes: Mutex<HashMap<NodeId, Arc<SceneRecorder>>>,
}

impl HtmlSceneCapability {
    /// Pages load the library from `url` when opened.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            library: Library::Remote(url.into()),
            scenes: Mutex::new(HashMap::new()),
        }
    }

    /// Download the library once and embed it in every page.
    pub async fn download(http: &reqwest::Client, url: &str) -> Result<Self, ViewerError> {
        info!(url, "Downloading 3Dmol.js");
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| ViewerError::CapabilityUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::CapabilityUnavailable(format!(
                "library download returned {}",
                status
            )));
        }

        let script = response
            .text()
            .await
            .map_err(|e| ViewerError::CapabilityUnavailable(e.to_string()))?;

        Ok(Self::embedded(script))
    }

    /// Pages carry `script` verbatim, so they open without network access.
    pub fn embedded(script: impl Into<String>) -> Self {
        Self {
            library: Library::Inline(script.into()),
            scenes: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live (not yet cleared) scenes.
    pub fn live_scenes(&self) -> usize {
        let mut scenes = self.scenes.lock();
        scenes.retain(|_, scene| !scene.is_cleared());
        scenes.len()
    }

    /// HTML page for the scene bound to `node`, if that scene is still live.
    pub fn document(&self, node: NodeId, title: &str) -> Option<String> {
        let scene = {
            let mut scenes = self.scenes.lock();
            scenes.retain(|_, scene| !scene.is_cleared());
            scenes.get(&node).cloned()?
        };
        Some(self.render_document(&scene, title))
    }

    fn render_document(&self, scene: &SceneRecorder, title: &str) -> String {
        let library = match &self.library {
            Library::Remote(url) => format!("<script src=\"{}\"></script>", escape_html(url)),
            Library::Inline(script) => format!(
                "<script src=\"data:text/javascript;base64,{}\"></script>",
                BASE64.encode(script)
            ),
        };
        let options = json!({
            "backgroundColor": scene.options.background_color,
            "antialias": scene.options.antialias,
        });
        let element_id = script_string(&scene.dom_id);

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        out.push_str(&library);
        out.push_str("\n<style>\nhtml, body { margin: 0; height: 100%; }\n");
        out.push_str(&format!(
            "#{} {{ width: {}; height: {}; position: {}; }}\n",
            scene.dom_id, scene.width, scene.height, scene.position
        ));
        out.push_str("</style>\n</head>\n<body>\n");
        out.push_str(&format!("<div id=\"{}\"></div>\n", scene.dom_id));
        out.push_str("<script>\n(function () {\n");
        out.push_str(&format!(
            "  var element = document.getElementById({});\n",
            element_id
        ));
        out.push_str(&format!(
            "  var viewer = $3Dmol.createViewer(element, {});\n",
            options
        ));
        for command in scene.commands.lock().iter() {
            out.push_str("  ");
            out.push_str(command);
            out.push('\n');
        }
        out.push_str("})();\n</script>\n</body>\n</html>\n");
        out
    }
}

#[async_trait]
impl RenderingCapability for HtmlSceneCapability {
    fn name(&self) -> &str {
        "3Dmol.js"
    }

    async fn create_viewer(
        &self,
        node: &SurfaceNode,
        options: &EngineOptions,
    ) -> Result<Arc<dyn ViewerInstance>, ViewerError> {
        let scene = Arc::new(SceneRecorder {
            node: node.id,
            dom_id: node.dom_id(),
            width: node.width.clone(),
            height: node.height.clone(),
            position: node.position.clone(),
            options: options.clone(),
            commands: Mutex::new(Vec::new()),
            cleared: AtomicBool::new(false),
        });
        self.scenes.lock().insert(node.id, Arc::clone(&scene));
        debug!(node = %node.id, "Scene created");
        Ok(scene)
    }
}

/// One recorded 3Dmol.js viewer.
struct SceneRecorder {
    node: NodeId,
    dom_id: String,
    width: String,
    height: String,
    position: String,
    options: EngineOptions,
    commands: Mutex<Vec<String>>,
    cleared: AtomicBool,
}

impl SceneRecorder {
    fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }

    fn record(&self, command: String) -> Result<(), ViewerError> {
        if self.is_cleared() {
            return Err(ViewerError::Render("viewer has been cleared".to_string()));
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

#[async_trait]
impl ViewerInstance for SceneRecorder {
    async fn add_model(&self, data: &str, format: StructureFormat) -> Result<(), ViewerError> {
        self.record(format!(
            "viewer.addModel({}, {});",
            script_string(data),
            script_string(format.tag())
        ))
    }

    fn set_style(&self, style: &Style) -> Result<(), ViewerError> {
        self.record(format!("viewer.setStyle({{}}, {});", style.to_json()))
    }

    fn add_style(&self, style: &Style) -> Result<(), ViewerError> {
        self.record(format!("viewer.addStyle({{}}, {});", style.to_json()))
    }

    fn zoom_to(&self) -> Result<(), ViewerError> {
        self.record("viewer.zoomTo();".to_string())
    }

    fn render(&self) -> Result<(), ViewerError> {
        self.record("viewer.render();".to_string())
    }

    fn clear(&self) -> Result<(), ViewerError> {
        if !self.cleared.swap(true, Ordering::SeqCst) {
            self.commands.lock().clear();
            debug!(node = %self.node, "Scene cleared");
        }
        Ok(())
    }
}

/// JSON string literal that is also safe inside a `<script>` element.
fn script_string(value: &str) -> String {
    escape_script(&serde_json::Value::String(value.to_string()).to_string())
}

fn escape_script(script: &str) -> String {
    script.replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoleculeType;
    use crate::viewer::style::StylePlan;

    #[tokio::test]
    async fn test_document_replays_calls() {
        let capability = HtmlSceneCapability::remote(LIBRARY_URL);
        let node = SurfaceNode::filling();
        let viewer = capability
            .create_viewer(&node, &EngineOptions::default())
            .await
            .unwrap();

        let plan = StylePlan::for_category(Some(MoleculeType::CoarseGrained));
        viewer.add_model("ATOM      1  CA", StructureFormat::Pdb).await.unwrap();
        viewer.set_style(&plan.base).unwrap();
        viewer.zoom_to().unwrap();
        viewer.render().unwrap();

        let html = capability.document(node.id, "Lysozyme").unwrap();
        assert!(html.contains("<title>Lysozyme</title>"));
        assert!(html.contains(LIBRARY_URL));
        assert!(html.contains("\"backgroundColor\":\"white\""));
        assert!(html.contains("viewer.addModel(\"ATOM      1  CA\", \"pdb\");"));
        assert!(html.contains("chainHetatm"));

        let add = html.find("addModel").unwrap();
        let zoom = html.find("zoomTo").unwrap();
        let render = html.find("viewer.render").unwrap();
        assert!(add < zoom && zoom < render);
    }

    #[tokio::test]
    async fn test_script_breakout_is_escaped() {
        let capability = HtmlSceneCapability::remote(LIBRARY_URL);
        let node = SurfaceNode::filling();
        let viewer = capability
            .create_viewer(&node, &EngineOptions::default())
            .await
            .unwrap();
        viewer
            .add_model("</script><script>alert(1)", StructureFormat::Pdb)
            .await
            .unwrap();

        let html = capability.document(node.id, "x").unwrap();
        assert!(!html.contains("</script><script>alert"));
    }

    #[tokio::test]
    async fn test_embedded_library_is_byte_exact() {
        let script = "var tag = '</script>'; window.$3Dmol = {};";
        let capability = HtmlSceneCapability::embedded(script);
        let node = SurfaceNode::filling();
        capability
            .create_viewer(&node, &EngineOptions::default())
            .await
            .unwrap();

        let html = capability.document(node.id, "x").unwrap();
        assert!(!html.contains(LIBRARY_URL));
        assert!(!html.contains("</script>'"));

        let prefix = "data:text/javascript;base64,";
        let start = html.find(prefix).unwrap() + prefix.len();
        let end = start + html[start..].find('"').unwrap();
        let decoded = BASE64.decode(&html[start..end]).unwrap();
        assert_eq!(decoded, script.as_bytes());
    }

    #[tokio::test]
    async fn test_cleared_scene_rejects_calls() {
        let capability = HtmlSceneCapability::remote(LIBRARY_URL);
        let node = SurfaceNode::filling();
        let viewer = capability
            .create_viewer(&node, &EngineOptions::default())
            .await
            .unwrap();

        assert_eq!(capability.live_scenes(), 1);
        viewer.clear().unwrap();
        viewer.clear().unwrap();
        assert!(viewer.render().is_err());
        assert_eq!(capability.live_scenes(), 0);
        assert!(capability.document(node.id, "x").is_none());
    }
}
