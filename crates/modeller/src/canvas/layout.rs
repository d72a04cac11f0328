//! Property stacking and connection endpoints.
//!
//! Property instances are laid out from scratch each time from the parent's
//! current bounds, never patched from their previous positions.

use modeller_core::geometry::{Bounds, Point, Size};

use super::model::{CanvasModel, ElementInstance, InstanceId, PropertyInstance};
use crate::{config::CanvasConfig, error::ModellerError};

/// Computes property instance positions below their parent.
#[derive(Debug, Clone, Copy)]
pub struct LayoutPropagator {
    width_ratio: f32,
    gap: f32,
}

impl Default for LayoutPropagator {
    fn default() -> Self {
        Self::new(0.9, 5.0)
    }
}

impl LayoutPropagator {
    pub fn new(width_ratio: f32, gap: f32) -> Self {
        Self { width_ratio, gap }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.property_width_ratio(), config.property_gap())
    }

    /// Positions for `children`, stacked under `parent` in the given order.
    ///
    /// Each child is `floor(parent.width * ratio)` wide, centred under the
    /// parent, and separated from the element above it by the gap.
    pub fn position_properties(
        &self,
        parent: &ElementInstance,
        children: &[&PropertyInstance],
    ) -> Vec<Bounds> {
        let parent_bounds = parent.bounds();
        let width = (parent_bounds.width() * self.width_ratio).floor();
        let x = parent_bounds.min_x() + (parent_bounds.width() - width) / 2.0;

        let mut y = parent_bounds.max_y();
        children
            .iter()
            .map(|child| {
                let top = y + self.gap;
                let bounds = Bounds::new_from_top_left(Point::new(x, top), Size::new(width, child.height));
                y = bounds.max_y();
                bounds
            })
            .collect()
    }

    /// Recompute the positions of every property instance under `parent`.
    pub fn apply(&self, model: &mut CanvasModel, parent: InstanceId) -> Result<(), ModellerError> {
        let element = model
            .element(parent)
            .ok_or_else(|| ModellerError::not_found("element instance", parent))?;
        let children = model.properties_of(parent);
        let positions: Vec<(InstanceId, Bounds)> = children
            .iter()
            .map(|c| c.id)
            .zip(self.position_properties(element, &children))
            .collect();

        for (id, bounds) in positions {
            model.set_property_bounds(id, bounds);
        }
        Ok(())
    }

    /// Recompute the positions of every property instance on the canvas.
    pub fn relayout_all(&self, model: &mut CanvasModel) -> Result<(), ModellerError> {
        let parents: Vec<InstanceId> = model.elements().map(|e| e.id).collect();
        for parent in parents {
            self.apply(model, parent)?;
        }
        Ok(())
    }
}

/// Endpoints of a line between two rectangles.
///
/// The centre-to-centre segment is clipped to each rectangle's border.
pub fn connection_endpoints(source: Bounds, target: Bounds) -> (Point, Point) {
    (
        source.border_point_toward(target.center()),
        target.border_point_toward(source.center()),
    )
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn canvas_with_parent(width: f32) -> (CanvasModel, InstanceId) {
        let mut model = CanvasModel::new(1, Size::new(1000.0, 1000.0));
        let parent = model
            .place_element(1, "Parent", Point::new(100.0, 50.0), Size::new(width, 100.0))
            .unwrap();
        (model, parent)
    }

    #[test]
    fn test_three_properties_stack_without_overlap() {
        let (mut model, parent) = canvas_with_parent(200.0);
        for name in ["One", "Two", "Three"] {
            model.attach_property(parent, 1, name, 30.0).unwrap();
        }
        LayoutPropagator::default().apply(&mut model, parent).unwrap();

        let children = model.properties_of(parent);
        assert_eq!(children.len(), 3);
        for child in &children {
            assert_approx_eq!(f32, child.width, 180.0);
            assert_approx_eq!(f32, child.x, 110.0);
        }
        assert_approx_eq!(f32, children[0].y, 155.0);
        for pair in children.windows(2) {
            let (upper, lower) = (pair[0].bounds(), pair[1].bounds());
            assert!(!upper.overlaps(lower));
            assert_approx_eq!(f32, lower.min_y() - upper.max_y(), 5.0);
        }
        let names: Vec<_> = children.iter().map(|c| c.instance_name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_width_is_floored() {
        let (mut model, parent) = canvas_with_parent(155.0);
        let child = model.attach_property(parent, 1, "Tag", 20.0).unwrap();
        LayoutPropagator::default().apply(&mut model, parent).unwrap();

        let child = model.property(child).unwrap();
        assert_approx_eq!(f32, child.width, 139.0);
        assert_approx_eq!(f32, child.x, 108.0);
    }

    #[test]
    fn test_relayout_follows_parent_move() {
        let (mut model, parent) = canvas_with_parent(200.0);
        let child = model.attach_property(parent, 1, "Tag", 20.0).unwrap();
        let layout = LayoutPropagator::default();
        layout.apply(&mut model, parent).unwrap();

        model.move_element(parent, Point::new(0.0, 0.0)).unwrap();
        layout.relayout_all(&mut model).unwrap();

        let child = model.property(child).unwrap();
        assert_approx_eq!(f32, child.x, 10.0);
        assert_approx_eq!(f32, child.y, 105.0);
    }

    #[test]
    fn test_endpoints_are_clipped_to_borders() {
        let source = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 50.0));
        let target = Bounds::new_from_top_left(Point::new(300.0, 0.0), Size::new(100.0, 50.0));

        let (from, to) = connection_endpoints(source, target);
        assert_approx_eq!(f32, from.x(), 100.0);
        assert_approx_eq!(f32, from.y(), 25.0);
        assert_approx_eq!(f32, to.x(), 300.0);
        assert_approx_eq!(f32, to.y(), 25.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    /// Stacked children never overlap each other or the parent.
    fn check_stacking(width: f32, heights: &[f32]) -> Result<(), TestCaseError> {
        let mut model = CanvasModel::new(1, Size::new(1000.0, 1000.0));
        let parent = model
            .place_element(1, "Parent", Point::new(0.0, 0.0), Size::new(width, 80.0))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for (i, height) in heights.iter().enumerate() {
            model
                .attach_property(parent, i as u64, "Tag", *height)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        LayoutPropagator::default()
            .apply(&mut model, parent)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let parent_bounds = model.element(parent).map(ElementInstance::bounds).unwrap_or_default();
        let children = model.properties_of(parent);
        for (i, child) in children.iter().enumerate() {
            prop_assert!(child.width <= width);
            prop_assert!(!child.bounds().overlaps(parent_bounds));
            for other in &children[i + 1..] {
                prop_assert!(!child.bounds().overlaps(other.bounds()));
                prop_assert!(other.y > child.y);
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn stacked_properties_never_overlap(
            width in 10.0f32..500.0,
            heights in prop::collection::vec(1.0f32..60.0, 0..8),
        ) {
            check_stacking(width, &heights)?;
        }
    }
}
