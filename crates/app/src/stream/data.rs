use image::Rgba;
use serde::Serialize;

/// Outcome of comparing one live frame against the session reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Match,
    NoMatch,
}

impl Verdict {
    pub(crate) fn from_match(matched: bool) -> Self {
        if matched { Verdict::Match } else { Verdict::NoMatch }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Verdict::Match => "Pose is correct.",
            Verdict::NoMatch => "Pose is not correct.",
        }
    }

    pub(crate) fn color(self) -> Rgba<u8> {
        match self {
            Verdict::Match => Rgba([0, 255, 0, 255]),
            Verdict::NoMatch => Rgba([255, 0, 0, 255]),
        }
    }
}

/// JSON body returned by the cursor navigation endpoints.
#[derive(Serialize)]
pub(crate) struct CursorResponse {
    pub(crate) index: usize,
    pub(crate) count: usize,
    pub(crate) name: String,
}
