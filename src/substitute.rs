//! Write the user's inputs into the template's named slots
//!
//! Every failure here is recoverable: the slot keeps its template content, a
//! warning is logged and the run goes on to compose and write outputs.

use std::sync::Arc;

use image::RgbaImage;
use log::{info, warn};

use crate::config::SlotNames;
use crate::inputs::Inputs;
use crate::template::{find_child_mut, require_nested_group_mut, Layer, SlotError, Template};

/// Outcome of filling one text slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSlotReport {
    pub layer: String,
    pub result: Result<(), SlotError>,
}

/// What substitution managed to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionReport {
    pub text_slots: Vec<TextSlotReport>,
    /// Number of placed layers that received the image
    pub images: Result<usize, SlotError>,
}

impl SubstitutionReport {
    /// Every slot that could not be filled
    pub fn warnings(&self) -> Vec<&SlotError> {
        self.text_slots
            .iter()
            .filter_map(|slot| slot.result.as_ref().err())
            .chain(self.images.as_ref().err())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.warnings().is_empty()
    }
}

/// Replace the content of each `(layer name, text)` pair among the direct
/// children of the text group
pub fn substitute_texts(
    layers: &mut [Layer],
    slots: &SlotNames,
    texts: [(&str, &str); 2],
) -> Vec<TextSlotReport> {
    let group = require_nested_group_mut(layers, &slots.outer_group, &slots.text_group);
    let group = match group {
        Ok(group) => group,
        Err(e) => {
            return texts
                .iter()
                .map(|(name, _)| TextSlotReport {
                    layer: name.to_string(),
                    result: Err(e.clone()),
                })
                .collect();
        }
    };

    texts
        .iter()
        .map(|(name, content)| {
            let result = set_text(group, name, content);
            TextSlotReport {
                layer: name.to_string(),
                result,
            }
        })
        .collect()
}

fn set_text(group: &mut Layer, name: &str, content: &str) -> Result<(), SlotError> {
    let group_name = group.name.clone();
    let layer = find_child_mut(group, name).ok_or_else(|| SlotError::LayerMissing {
        name: name.to_string(),
        group: group_name,
    })?;
    layer.as_text_mut()?.set_text(content);
    Ok(())
}

/// Swap the payload of every placed layer directly inside the image group.
/// All of them share the same image.
pub fn substitute_images(
    layers: &mut [Layer],
    slots: &SlotNames,
    image: &Arc<RgbaImage>,
) -> Result<usize, SlotError> {
    let group = require_nested_group_mut(layers, &slots.outer_group, &slots.image_group)?;
    let mut replaced = 0;
    for child in group.children_mut().unwrap_or_default() {
        if let Some(placed) = child.as_placed_mut() {
            placed.replace(Arc::clone(image));
            replaced += 1;
        }
    }
    Ok(replaced)
}

/// Fill every slot, logging each outcome
pub fn apply(template: &mut Template, slots: &SlotNames, inputs: &Inputs) -> SubstitutionReport {
    let text_slots = substitute_texts(
        &mut template.layers,
        slots,
        [
            (slots.first_text_layer.as_str(), inputs.first_text.as_str()),
            (slots.second_text_layer.as_str(), inputs.second_text.as_str()),
        ],
    );
    for slot in &text_slots {
        match &slot.result {
            Ok(()) => info!("replaced text of '{}'", slot.layer),
            Err(e) => warn!("text slot '{}' left unchanged: {}", slot.layer, e),
        }
    }

    let images = substitute_images(&mut template.layers, slots, &inputs.image);
    match &images {
        Ok(0) => warn!(
            "group '{}' has no placed layers; no image replaced",
            slots.image_group
        ),
        Ok(n) => info!("replaced {} embedded image(s) in '{}'", n, slots.image_group),
        Err(e) => warn!("image substitution skipped: {}", e),
    }

    SubstitutionReport { text_slots, images }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::template::{find_child, find_group, LayerKind, Mask, PlacedLayer, Placement, TextLayer};

    fn text(name: &str, content: &str) -> Layer {
        Layer::new(name, LayerKind::Text(TextLayer::new(content)))
    }

    fn placed(name: &str) -> Layer {
        Layer::new(
            name,
            LayerKind::Placed(PlacedLayer::new(
                Placement::new(0.0, 0.0, 4.0, 4.0),
                Mask::None,
                Arc::new(RgbaImage::new(4, 4)),
            )),
        )
    }

    fn tree() -> Vec<Layer> {
        vec![Layer::group(
            "模板",
            vec![
                Layer::group(
                    "改文本",
                    vec![text("文字1", "old one"), text("文字2", "old two")],
                ),
                Layer::group(
                    "改图",
                    vec![placed("圆1"), text("caption", "c"), placed("圆2")],
                ),
                placed("outside"),
            ],
        )]
    }

    fn texts() -> [(&'static str, &'static str); 2] {
        [("文字1", "new one"), ("文字2", "new two")]
    }

    fn text_of(layers: &[Layer], group: &str, name: &str) -> String {
        let group = find_group(layers, group).unwrap();
        find_child(group, name)
            .unwrap()
            .as_text()
            .unwrap()
            .content
            .clone()
    }

    #[test]
    fn test_both_texts_replaced() {
        let mut layers = tree();
        let reports = substitute_texts(&mut layers, &SlotNames::default(), texts());
        assert!(reports.iter().all(|r| r.result.is_ok()));
        assert_eq!(text_of(&layers, "改文本", "文字1"), "new one");
        assert_eq!(text_of(&layers, "改文本", "文字2"), "new two");
    }

    #[test]
    fn test_missing_text_layer_is_reported() {
        let mut layers = tree();
        let reports = substitute_texts(
            &mut layers,
            &SlotNames::default(),
            [("文字1", "x"), ("文字3", "y")],
        );
        assert!(reports[0].result.is_ok());
        assert_eq!(
            reports[1].result,
            Err(SlotError::LayerMissing {
                name: "文字3".to_string(),
                group: "改文本".to_string(),
            })
        );
    }

    #[test]
    fn test_wrong_kind_leaves_layer_alone() {
        let mut layers = tree();
        let slots = SlotNames {
            text_group: "改图".to_string(),
            ..SlotNames::default()
        };
        let reports = substitute_texts(&mut layers, &slots, [("圆1", "x"), ("caption", "y")]);
        assert!(matches!(
            reports[0].result,
            Err(SlotError::WrongKind { expected: "text", found: "placed", .. })
        ));
        assert!(reports[1].result.is_ok());
        assert_eq!(text_of(&layers, "改图", "caption"), "y");
    }

    #[test]
    fn test_missing_outer_group_reports_every_slot() {
        let mut layers = tree();
        let slots = SlotNames {
            outer_group: "nope".to_string(),
            ..SlotNames::default()
        };
        let reports = substitute_texts(&mut layers, &slots, texts());
        assert_eq!(reports.len(), 2);
        assert!(reports
            .iter()
            .all(|r| matches!(r.result, Err(SlotError::GroupMissing { .. }))));
        assert_eq!(text_of(&layers, "改文本", "文字1"), "old one");
    }

    #[test]
    fn test_images_replaced_in_group_only() {
        let mut layers = tree();
        let image = Arc::new(RgbaImage::new(9, 9));
        let count = substitute_images(&mut layers, &SlotNames::default(), &image).unwrap();
        assert_eq!(count, 2);

        let group = find_group(&layers, "改图").unwrap();
        for child in group.children().unwrap() {
            if let Some(p) = child.as_placed() {
                assert!(Arc::ptr_eq(p.content(), &image));
            }
        }
        let outer = find_group(&layers, "模板").unwrap();
        let outside = find_child(outer, "outside").unwrap();
        assert_eq!(outside.as_placed().unwrap().content().dimensions(), (4, 4));
    }

    #[test]
    fn test_missing_image_group() {
        let mut layers = tree();
        let slots = SlotNames {
            image_group: "photos".to_string(),
            ..SlotNames::default()
        };
        let err = substitute_images(&mut layers, &slots, &Arc::new(RgbaImage::new(1, 1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "group 'photos' not found inside '模板'");
    }

    #[test]
    fn test_report_warnings() {
        let report = SubstitutionReport {
            text_slots: vec![
                TextSlotReport {
                    layer: "a".to_string(),
                    result: Ok(()),
                },
                TextSlotReport {
                    layer: "b".to_string(),
                    result: Err(SlotError::LayerMissing {
                        name: "b".to_string(),
                        group: "g".to_string(),
                    }),
                },
            ],
            images: Ok(3),
        };
        assert_eq!(report.warnings().len(), 1);
        assert!(!report.is_complete());
    }
}
