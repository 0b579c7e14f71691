use glam::UVec2;
use std::fmt;
use std::path::PathBuf;

use crate::CropError;

/// A crop region in ImageMagick geometry terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropRect {
    pub fn square(side: u32, offset: UVec2) -> Self {
        Self {
            width: side,
            height: side,
            x: offset.x,
            y: offset.y,
        }
    }
}

// `WxH+X+Y`, as accepted by `-crop`.
impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A single row of square cards laid out left to right on a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub side: u32,
    pub start: UVec2,
    pub step: u32,
    pub count: u32,
}

impl CardLayout {
    pub fn validate(&self) -> Result<(), CropError> {
        if self.side == 0 {
            return Err(CropError::InvalidLayout("side length must be positive".into()));
        }

        if self.step == 0 {
            return Err(CropError::InvalidLayout("step must be positive".into()));
        }

        if let Some(last) = self.count.checked_sub(1) {
            let overflows = last
                .checked_mul(self.step)
                .and_then(|advance| advance.checked_add(self.start.x))
                .and_then(|x| x.checked_add(self.side))
                .is_none()
                || self.start.y.checked_add(self.side).is_none();

            if overflows {
                return Err(CropError::InvalidLayout(format!(
                    "card {} would lie past the u32 coordinate range",
                    last
                )));
            }
        }

        Ok(())
    }

    /// Closed form for card `index`; only the horizontal offset advances.
    /// `None` when the offset leaves the `u32` range.
    pub fn rect(&self, index: u32) -> Option<CropRect> {
        let x = index.checked_mul(self.step)?.checked_add(self.start.x)?;
        Some(CropRect::square(self.side, UVec2::new(x, self.start.y)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNaming {
    pub dir: PathBuf,
    pub prefix: String,
    pub extension: String,
}

impl OutputNaming {
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.prefix, index, self.extension))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardJob {
    pub index: u32,
    pub rect: CropRect,
    pub output: PathBuf,
}

pub fn plan(layout: &CardLayout, naming: &OutputNaming) -> Result<Vec<CardJob>, CropError> {
    layout.validate()?;

    (0..layout.count)
        .map(|index| {
            let rect = layout.rect(index).ok_or_else(|| {
                CropError::InvalidLayout(format!("card {} has no representable offset", index))
            })?;

            Ok(CardJob {
                index,
                rect,
                output: naming.path_for(index),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    fn special_cards() -> CardLayout {
        CardLayout {
            side: 796,
            start: UVec2::new(50, 115),
            step: 798,
            count: 3,
        }
    }

    fn cards_dir() -> OutputNaming {
        OutputNaming {
            dir: PathBuf::from("cards"),
            prefix: "special_".into(),
            extension: "jpg".into(),
        }
    }

    #[test]
    fn special_card_geometry() {
        let jobs = plan(&special_cards(), &cards_dir()).unwrap();

        let geometry: Vec<String> = jobs.iter().map(|job| job.rect.to_string()).collect();
        assert_eq!(
            geometry,
            ["796x796+50+115", "796x796+848+115", "796x796+1646+115"]
        );

        let outputs: Vec<PathBuf> = jobs.iter().map(|job| job.output.clone()).collect();
        assert_eq!(
            outputs,
            [
                Path::new("cards").join("special_0.jpg"),
                Path::new("cards").join("special_1.jpg"),
                Path::new("cards").join("special_2.jpg"),
            ]
        );
    }

    #[test]
    fn offsets_follow_closed_form() {
        let layout = CardLayout {
            side: 10,
            start: UVec2::new(7, 3),
            step: 12,
            count: 40,
        };

        for index in 0..layout.count {
            let rect = layout.rect(index).unwrap();
            assert_eq!(rect.x, 7 + index * 12);
            assert_eq!(rect.y, 3);
            assert_eq!((rect.width, rect.height), (10, 10));
        }
    }

    #[test]
    fn indices_are_contiguous() {
        let layout = CardLayout {
            count: 17,
            ..special_cards()
        };
        let jobs = plan(&layout, &cards_dir()).unwrap();

        assert_eq!(jobs.len(), 17);
        assert!(jobs.iter().enumerate().all(|(i, job)| job.index == i as u32));

        let outputs: HashSet<_> = jobs.iter().map(|job| &job.output).collect();
        assert_eq!(outputs.len(), 17);
    }

    #[test]
    fn rect_past_the_coordinate_range_is_none() {
        let layout = CardLayout {
            step: u32::MAX / 2,
            count: 4,
            ..special_cards()
        };

        assert!(layout.rect(1).is_some());
        assert_eq!(layout.rect(3), None);
        assert_eq!(CardLayout { step: 1, ..layout }.rect(u32::MAX), None);
    }

    #[test]
    fn zero_count_plans_nothing() {
        let layout = CardLayout {
            count: 0,
            ..special_cards()
        };

        assert!(plan(&layout, &cards_dir()).unwrap().is_empty());
    }

    #[test]
    fn rejects_degenerate_layouts() {
        let zero_side = CardLayout {
            side: 0,
            ..special_cards()
        };
        let zero_step = CardLayout {
            step: 0,
            ..special_cards()
        };
        let too_far = CardLayout {
            step: u32::MAX / 2,
            count: 4,
            ..special_cards()
        };

        for layout in [zero_side, zero_step, too_far] {
            assert!(matches!(
                layout.validate(),
                Err(CropError::InvalidLayout(_))
            ));
        }
    }
}
