//! Per-frame discovery of the active camera pose and light positions.

use prism_math::{point, Mat4, Vec4};

use crate::scene::{NodeId, SceneGraph};
use crate::visitor::{traverse, TransformStack, Visitor};

/// Camera and lights found in one traversal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneSurvey {
    /// World pose of the first active camera in traversal order
    pub camera: Option<Mat4>,
    pub camera_node: Option<NodeId>,
    /// World positions of all light nodes (w = 1)
    pub lights: Vec<Vec4>,
}

impl SceneSurvey {
    /// World-space eye position of the active camera.
    pub fn camera_position(&self) -> Option<Vec4> {
        self.camera.map(|pose| pose * point(0.0, 0.0, 0.0))
    }
}

#[derive(Default)]
struct SurveyVisitor {
    stack: TransformStack,
    survey: SceneSurvey,
}

impl Visitor for SurveyVisitor {
    fn transforms(&mut self) -> &mut TransformStack {
        &mut self.stack
    }

    fn visit_camera(&mut self, id: NodeId, active: bool) {
        if !active {
            return;
        }
        if self.survey.camera.is_some() {
            log::debug!("Ignoring additional active camera {}", id);
            return;
        }
        self.survey.camera = Some(self.stack.top());
        self.survey.camera_node = Some(id);
    }

    fn visit_light(&mut self, _id: NodeId) {
        self.survey.lights.push(self.stack.top() * point(0.0, 0.0, 0.0));
    }
}

/// Walk the graph once and collect camera pose and lights.
pub fn survey(graph: &SceneGraph) -> SceneSurvey {
    let mut visitor = SurveyVisitor::default();
    traverse(graph, &mut visitor);
    visitor.survey
}
