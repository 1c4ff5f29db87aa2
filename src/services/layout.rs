//! Collapse / detach / fullscreen flags for the three studio panels, and the
//! size table each viewport class uses.
//!
//! Toggles are pure: they read the current state and return the patch to
//! hand to `Studio::update_state`.

use crate::core::state::{StudioPatch, StudioState};

pub fn toggle_left_panel(state: &StudioState) -> StudioPatch {
    StudioPatch {
        is_left_panel_collapsed: Some(!state.is_left_panel_collapsed),
        ..Default::default()
    }
}

pub fn toggle_right_panel(state: &StudioState) -> StudioPatch {
    StudioPatch {
        is_right_panel_collapsed: Some(!state.is_right_panel_collapsed),
        ..Default::default()
    }
}

pub fn toggle_preview_fullscreen(state: &StudioState) -> StudioPatch {
    StudioPatch {
        is_preview_fullscreen: Some(!state.is_preview_fullscreen),
        ..Default::default()
    }
}

/// Docking or undocking always leaves fullscreen off.
pub fn toggle_preview_detached(state: &StudioState) -> StudioPatch {
    StudioPatch {
        is_preview_detached: Some(!state.is_preview_detached),
        is_preview_fullscreen: Some(false),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Mobile,
    Tablet,
    Desktop,
}

impl Viewport {
    pub const TABLET_MIN_WIDTH: u32 = 768;
    pub const DESKTOP_MIN_WIDTH: u32 = 1024;

    pub fn from_width(width: u32) -> Self {
        if width < Self::TABLET_MIN_WIDTH {
            Viewport::Mobile
        } else if width < Self::DESKTOP_MIN_WIDTH {
            Viewport::Tablet
        } else {
            Viewport::Desktop
        }
    }
}

/// Percentages of the studio width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSizes {
    pub min: u8,
    pub default: u8,
    pub max: u8,
    pub collapsible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub sidebar: PanelSizes,
    pub editor: PanelSizes,
    pub preview: PanelSizes,
}

const MOBILE: LayoutConfig = LayoutConfig {
    sidebar: PanelSizes { min: 0, default: 0, max: 100, collapsible: true },
    editor: PanelSizes { min: 50, default: 100, max: 100, collapsible: false },
    preview: PanelSizes { min: 0, default: 0, max: 100, collapsible: true },
};

const TABLET: LayoutConfig = LayoutConfig {
    sidebar: PanelSizes { min: 15, default: 25, max: 35, collapsible: true },
    editor: PanelSizes { min: 35, default: 45, max: 70, collapsible: false },
    preview: PanelSizes { min: 20, default: 30, max: 45, collapsible: true },
};

const DESKTOP: LayoutConfig = LayoutConfig {
    sidebar: PanelSizes { min: 15, default: 20, max: 30, collapsible: true },
    editor: PanelSizes { min: 30, default: 45, max: 60, collapsible: false },
    preview: PanelSizes { min: 25, default: 35, max: 50, collapsible: true },
};

/// Effective widths after collapse, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelWidths {
    pub sidebar: u8,
    pub editor: u8,
    pub preview: u8,
}

impl LayoutConfig {
    pub fn for_viewport(viewport: Viewport) -> Self {
        match viewport {
            Viewport::Mobile => MOBILE,
            Viewport::Tablet => TABLET,
            Viewport::Desktop => DESKTOP,
        }
    }

    pub fn for_width(width: u32) -> Self {
        Self::for_viewport(Viewport::from_width(width))
    }

    /// Collapsed panels give their share to the editor. A detached or
    /// fullscreen preview takes no room in the docked layout.
    pub fn effective_widths(&self, state: &StudioState) -> PanelWidths {
        let sidebar = if state.is_left_panel_collapsed && self.sidebar.collapsible {
            0
        } else {
            self.sidebar.default
        };
        let preview_hidden = state.is_preview_detached || state.is_preview_fullscreen;
        let preview = if (state.is_right_panel_collapsed && self.preview.collapsible) || preview_hidden {
            0
        } else {
            self.preview.default
        };

        PanelWidths {
            sidebar,
            editor: 100 - sidebar - preview,
            preview,
        }
    }

    /// Inline style for the preview pane. A fullscreen preview covers the
    /// viewport through its own class, so it gets no width.
    pub fn preview_style(&self, state: &StudioState) -> String {
        if state.is_preview_fullscreen {
            String::new()
        } else {
            format!("width:{}%", self.effective_widths(state).preview)
        }
    }
}
