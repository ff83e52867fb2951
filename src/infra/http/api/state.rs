use std::sync::Arc;

use crate::application::{export::ExportService, render::RenderService};

#[derive(Clone)]
pub struct ApiState {
    pub export: Arc<ExportService>,
    pub renderer: Arc<dyn RenderService>,
}

impl ApiState {
    pub fn new(export: ExportService, renderer: Arc<dyn RenderService>) -> Self {
        Self {
            export: Arc::new(export),
            renderer,
        }
    }
}
