use std::sync::Arc;

use subwm::config::{DeviceOrientation, SystemProperties};
use subwm::constants::KEYBOARD_TAG;
use subwm::container::ContainerScope;
use subwm::geometry::{OffsetF, Rect};
use subwm::overlay::{ComponentKind, ComponentRef, DialogProperties, MenuParam, NodeRef, PopupInfo};
use subwm::sim::{MemoryContainer, MemoryWindow, ParentSpec, SimBackend};
use subwm::subwindow::{HideOutcome, Subwindow, SubwindowOptions};
use subwm::window::{Window, WindowRect, WindowType};

struct Fixture {
    backend: SimBackend,
    subwindow: Arc<Subwindow>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_backend(SimBackend::new(), ParentSpec::new(1))
    }

    fn with_backend(backend: SimBackend, parent: ParentSpec) -> Self {
        let parent_id = parent.id;
        backend.add_parent(parent);
        let subwindow = Subwindow::create(backend.platform(), parent_id, SubwindowOptions::default())
            .expect("init");
        Self { backend, subwindow }
    }

    fn window(&self) -> Arc<MemoryWindow> {
        let id = self.subwindow.window().unwrap().window_id();
        self.backend.windows.window(id).unwrap()
    }

    fn window_target(&self) -> String {
        format!("window:{}", self.window().window_id())
    }

    fn child(&self) -> Arc<MemoryContainer> {
        self.backend
            .containers
            .memory_container(self.subwindow.child_container_id())
            .unwrap()
    }

    fn child_overlay_target(&self) -> String {
        format!("overlay:{}", self.subwindow.child_container_id())
    }

    fn child_pipeline_target(&self) -> String {
        format!("pipeline:{}", self.subwindow.child_container_id())
    }

    /// Positions of the last child pipeline flush and the last window hide
    /// in the recorded event stream.
    fn flush_and_hide_positions(&self) -> (usize, usize) {
        let events = self.backend.recorder.events();
        let position = |target: &str, name: &str| {
            events
                .iter()
                .rposition(|event| event.target == target && event.name() == name)
                .unwrap()
        };
        (
            position(&self.child_pipeline_target(), "flush_pipeline_immediately"),
            position(&self.window_target(), "hide"),
        )
    }

    fn root_tags(&self) -> Vec<String> {
        self.child()
            .memory_pipeline()
            .root()
            .children()
            .into_iter()
            .map(|node| node.tag)
            .collect()
    }
}

fn focusable_popup() -> PopupInfo {
    PopupInfo {
        focusable: true,
        ..PopupInfo::default()
    }
}

#[test]
fn repeated_show_is_a_no_op() {
    let f = Fixture::new();
    let target = f.window_target();

    f.subwindow.show_window(false).expect("first show");
    f.subwindow.show_window(false).expect("second show");

    assert!(f.subwindow.is_showed());
    assert_eq!(f.backend.recorder.count(&target, "show"), 1);
    assert_eq!(f.backend.recorder.count(&target, "set_touch_hot_areas"), 1);
    assert_eq!(f.backend.recorder.count(&target, "request_focus"), 0);
}

#[test]
fn show_without_window_is_an_error() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(1));
    let subwindow = Subwindow::new(backend.platform(), 1);
    assert!(subwindow.show_window(true).is_err());
    assert_eq!(subwindow.hide_window(), HideOutcome::Skipped);
}

#[test]
fn show_marks_subwindow_current_and_announces_it() {
    let f = Fixture::new();
    f.subwindow.show_window(true).expect("show");

    let current = f.backend.platform().manager.current_window(1).unwrap();
    assert!(Arc::ptr_eq(&current, &f.subwindow));
    assert!(f.window().is_shown());
    assert!(f.subwindow.is_focused());
    assert_eq!(f.child().memory_pipeline().accessibility_events().len(), 1);
}

#[test]
fn popup_round_trip_hides_window() {
    let f = Fixture::new();

    f.subwindow.show_popup_ng(7, &focusable_popup(), None, false);

    assert!(f.subwindow.is_showed());
    assert_eq!(f.subwindow.popup_target_id(), 7);
    assert_eq!(f.root_tags(), vec!["Popup"]);
    assert!(f.window().is_touchable());
    let shown = f
        .backend
        .recorder
        .last(&f.child_overlay_target(), "show_popup")
        .unwrap();
    assert_eq!(shown.scope, f.subwindow.child_container_id());
    assert_eq!(ContainerScope::current_id(), -1);

    f.subwindow.hide_popup_ng(-1);

    assert!(!f.subwindow.is_showed());
    assert!(!f.window().is_shown());
    assert!(f.root_tags().is_empty());
    let column = f
        .backend
        .recorder
        .last("overlay:1", "remove_event_column")
        .unwrap();
    assert_eq!(column.scope, 1);
}

#[test]
fn hide_is_refused_while_content_is_mounted() {
    let f = Fixture::new();
    f.subwindow.show_popup_ng(7, &focusable_popup(), None, false);
    f.subwindow.show_popup_ng(8, &focusable_popup(), None, false);
    let target = f.window_target();

    f.subwindow.hide_popup_ng(7);

    assert_eq!(f.root_tags(), vec!["Popup"]);
    assert!(f.subwindow.is_showed());
    assert_eq!(f.backend.recorder.count(&target, "hide"), 0);
    assert_eq!(f.subwindow.hide_window(), HideOutcome::Refused);
}

#[test]
fn refused_hide_restores_hot_areas_of_top_node() {
    let f = Fixture::new();
    f.subwindow.show_popup_ng(7, &focusable_popup(), None, false);
    let top = f.child().memory_pipeline().root().children()[0].clone();
    f.subwindow
        .set_hot_areas(&[Rect::new(10.0, 20.0, 30.0, 40.0)], top.id);
    f.subwindow.set_hot_areas(&[Rect::new(0.0, 0.0, 5.0, 5.0)], -1);

    assert_eq!(f.subwindow.hide_window(), HideOutcome::Refused);
    assert_eq!(f.window().hot_areas(), vec![WindowRect::new(10, 20, 30, 40)]);
}

#[test]
fn keyboard_alone_does_not_keep_window() {
    let f = Fixture::new();
    f.subwindow.show_window(false).expect("show");
    f.child()
        .memory_pipeline()
        .root()
        .mount(NodeRef::new(3, KEYBOARD_TAG));

    assert_eq!(f.subwindow.hide_window(), HideOutcome::Hidden);
    assert!(!f.subwindow.is_showed());
    assert!(!f.child().memory_pipeline().focus_active());
}

#[test]
fn hide_failure_keeps_showed_flag() {
    let f = Fixture::new();
    f.subwindow.show_window(false).expect("show");
    f.window().fail_on("hide", subwm::WmError::Denied);

    assert_eq!(
        f.subwindow.hide_window(),
        HideOutcome::Failed(subwm::WmError::Denied)
    );
    assert!(f.subwindow.is_showed());
}

#[test]
fn hot_area_union_and_fallback() {
    let f = Fixture::new();
    let a = Rect::new(0.0, 0.0, 100.0, 200.0);
    let b = Rect::new(50.0, 600.0, 300.0, 120.0);

    f.subwindow.set_hot_areas(&[a], 7);
    f.subwindow.set_hot_areas(&[b], 9);
    assert_eq!(
        f.window().hot_areas(),
        vec![WindowRect::new(0, 0, 100, 200), WindowRect::new(50, 600, 300, 120)]
    );
    assert_eq!(f.subwindow.hot_area_nodes(), vec![7, 9]);

    f.subwindow.set_hot_areas(&[a, b], 7);
    assert_eq!(f.window().hot_areas().len(), 3);

    f.subwindow.delete_hot_areas(7);
    assert_eq!(f.window().hot_areas(), vec![WindowRect::new(50, 600, 300, 120)]);
    f.subwindow.delete_hot_areas(9);
    assert_eq!(f.window().hot_areas(), vec![WindowRect::new(0, 0, 1, 1)]);
    assert!(f.subwindow.hot_area_nodes().is_empty());
}

#[test]
fn unowned_hot_areas_are_not_pushed() {
    let f = Fixture::new();
    f.subwindow
        .set_hot_areas(&[Rect::new(10.0, 20.0, 30.0, 40.0)], 3);

    f.subwindow.set_hot_areas(&[Rect::new(0.0, 0.0, 5.0, 5.0)], -1);

    assert_eq!(f.window().hot_areas(), vec![WindowRect::new(10, 20, 30, 40)]);
    assert_eq!(f.subwindow.hot_area_nodes(), vec![3]);
}

#[test]
fn single_node_hot_area_falls_back_to_one_pixel() {
    let f = Fixture::new();
    f.subwindow
        .set_hot_areas(&[Rect::new(0.0, 0.0, 100.0, 200.0)], 7);
    f.subwindow.delete_hot_areas(7);
    assert_eq!(f.window().hot_areas(), vec![WindowRect::new(0, 0, 1, 1)]);
}

#[test]
fn menu_is_built_in_subwindow_and_hidden_with_filters() {
    let f = Fixture::new();
    let target = NodeRef::new(7, "Button");

    f.subwindow.show_menu_ng_with_builder(
        Box::new(|| Some(NodeRef::new(20, "Column"))),
        None,
        &MenuParam::default(),
        Some(&target),
        OffsetF::new(12.0, 34.0),
    );

    assert!(f.subwindow.is_showed());
    assert_eq!(f.root_tags(), vec!["MenuWrapper"]);
    assert_eq!(
        f.backend
            .recorder
            .last(&f.window_target(), "resize")
            .unwrap()
            .op,
        "resize 1080x2340"
    );
    assert!(f.subwindow.menu_preview_center().is_some());

    f.subwindow.hide_menu_ng(false, false);

    assert!(!f.subwindow.is_showed());
    assert_eq!(f.backend.recorder.count(&f.child_overlay_target(), "remove_filter"), 1);
    assert_eq!(f.backend.recorder.count("overlay:1", "remove_filter"), 1);
    assert_eq!(
        f.backend
            .recorder
            .count("overlay:1", "remove_gather_node_with_animation"),
        1
    );
}

#[test]
fn hide_menu_flushes_before_hiding_window() {
    let f = Fixture::new();
    f.subwindow.show_menu_ng(
        NodeRef::new(21, "Column"),
        &MenuParam::default(),
        Some(&NodeRef::new(7, "Button")),
        OffsetF::default(),
    );
    f.backend.recorder.clear();

    f.subwindow.hide_menu_ng(false, false);

    assert!(!f.subwindow.is_showed());
    let (flushed, hidden) = f.flush_and_hide_positions();
    assert!(flushed < hidden);
}

#[test]
fn hiding_one_menu_node_keeps_window_for_the_other() {
    let f = Fixture::new();
    for target in [7, 8] {
        f.subwindow.show_menu_ng(
            NodeRef::new(20 + target, "Column"),
            &MenuParam::default(),
            Some(&NodeRef::new(target, "Button")),
            OffsetF::default(),
        );
    }
    let menus = f.child().memory_pipeline().root().children();
    assert_eq!(menus.len(), 2);
    f.backend.recorder.clear();

    f.subwindow.hide_menu_node_ng(&menus[0], 7);

    assert!(f.subwindow.is_showed());
    assert_eq!(f.backend.recorder.count(&f.child_pipeline_target(), "flush_pipeline_immediately"), 1);
    assert_eq!(f.backend.recorder.count(&f.window_target(), "hide"), 0);
    assert_eq!(f.backend.recorder.count("overlay:1", "remove_event_column"), 1);

    f.subwindow.hide_menu_node_ng(&menus[1], 8);

    assert!(!f.subwindow.is_showed());
    assert!(f.root_tags().is_empty());
    let (flushed, hidden) = f.flush_and_hide_positions();
    assert!(flushed < hidden);
}

#[test]
fn hide_tips_cleans_parent_overlay() {
    let f = Fixture::new();
    f.subwindow.show_tips_ng(7, &PopupInfo::default(), 300, 0);
    assert_eq!(f.root_tags(), vec!["Popup"]);

    f.subwindow.hide_tips_ng(-1, 200);

    assert!(!f.subwindow.is_showed());
    assert_eq!(
        f.backend
            .recorder
            .last(&f.child_overlay_target(), "hide_tips")
            .unwrap()
            .op,
        "hide_tips 7 disappearing=200"
    );
    assert_eq!(f.backend.recorder.count("overlay:1", "remove_event_column"), 1);
    assert_eq!(f.backend.recorder.count("overlay:1", "remove_pixel_map"), 1);
}

#[test]
fn menu_without_target_is_ignored() {
    let f = Fixture::new();
    f.subwindow.show_menu_ng(
        NodeRef::new(20, "Column"),
        &MenuParam::default(),
        None,
        OffsetF::default(),
    );
    assert!(!f.subwindow.is_showed());
    assert!(f.root_tags().is_empty());
}

#[test]
fn landscape_menu_stays_in_parent_window() {
    let backend = SimBackend::new().with_system_properties(SystemProperties {
        orientation: DeviceOrientation::Landscape,
        ..SystemProperties::default()
    });
    let f = Fixture::with_backend(
        backend,
        ParentSpec::new(1).rect(WindowRect::new(0, 0, 1200, 800)),
    );
    let target = NodeRef::new(7, "Button");

    f.subwindow.show_menu_ng(
        NodeRef::new(21, "Column"),
        &MenuParam::default(),
        Some(&target),
        OffsetF::default(),
    );

    assert_eq!(
        f.backend
            .recorder
            .last(&f.window_target(), "resize")
            .unwrap()
            .op,
        "resize 1200x800"
    );
}

#[test]
fn clear_menu_hides_window() {
    let f = Fixture::new();
    let target = NodeRef::new(7, "Button");
    f.subwindow.show_menu_ng(
        NodeRef::new(21, "Column"),
        &MenuParam::default(),
        Some(&target),
        OffsetF::default(),
    );

    f.subwindow.clear_menu_ng(7, true, false);

    assert!(!f.subwindow.is_showed());
    assert!(f.root_tags().is_empty());
    assert_eq!(
        f.backend
            .recorder
            .count(&f.child_overlay_target(), "erase_menu_info"),
        1
    );
}

#[test]
fn dialog_is_full_screen_and_registers_modal_target() {
    let f = Fixture::new();

    let dialog = f
        .subwindow
        .show_dialog_ng(
            &DialogProperties::default(),
            Box::new(|| Some(NodeRef::new(30, "Column"))),
        )
        .expect("dialog shown");

    assert!(f.subwindow.have_dialog());
    assert!(f.window().is_full_screen());
    assert!(f.window().follows_parent_layout());
    let parent = f.backend.containers.memory_container(1).unwrap();
    assert_eq!(
        parent.memory_pipeline().overlay().sub_window_id(),
        Some(f.subwindow.child_container_id())
    );
    assert_eq!(parent.memory_pipeline().overlay().modal_display_id(), Some(0));
    // only modal dialogs of ui extensions are tracked by node
    assert_eq!(f.subwindow.node_id(), None);

    f.subwindow.close_dialog_ng(&dialog);
    assert!(f.root_tags().is_empty());
    assert_eq!(f.subwindow.hide_window(), HideOutcome::Hidden);
}

#[test]
fn ui_extension_modal_dialog_becomes_dialog_subwindow() {
    let backend = SimBackend::new();
    let parent = ParentSpec::new(1)
        .window_type(WindowType::UiExtension)
        .flags(|flags| flags.ui_extension = true);
    backend.add_parent(parent);
    backend
        .parent_window(1)
        .unwrap()
        .set_host_rect(WindowRect::new(0, 0, 720, 1280));
    let subwindow =
        Subwindow::create(backend.platform(), 1, SubwindowOptions::default()).expect("init");

    let dialog = subwindow
        .show_dialog_ng_with_node(&DialogProperties::default(), NodeRef::new(30, "Column"))
        .expect("dialog shown");

    assert_eq!(subwindow.node_id(), Some(dialog.id));
    let manager = backend.platform().manager;
    assert_eq!(manager.dialog_node_parent(dialog.id), Some(1));
    assert!(
        manager
            .subwindow_of_kind(1, subwm::manager::SubwindowKind::Dialog)
            .is_some()
    );
}

#[test]
fn custom_dialog_reports_its_node() {
    let f = Fixture::new();
    let (tx, rx) = std::sync::mpsc::channel();

    f.subwindow.open_custom_dialog_ng(
        &DialogProperties::default(),
        Box::new(move |id| {
            let _ = tx.send(id);
        }),
    );

    let id = rx.recv().unwrap();
    assert_eq!(f.root_tags(), vec!["Dialog"]);
    f.subwindow.close_custom_dialog(id);
    assert!(f.root_tags().is_empty());
}

#[test]
fn preview_is_untouchable_unless_dragging_from_subwindow() {
    let f = Fixture::new();
    assert!(f.subwindow.show_preview_ng(false));
    assert!(!f.window().is_touchable());

    f.subwindow.hide_preview_ng();
    assert!(!f.subwindow.is_showed());
    assert_eq!(
        f.backend
            .recorder
            .count(&f.child_overlay_target(), "remove_preview_badge_node"),
        1
    );
}

#[test]
fn select_overlay_is_mounted_without_focus() {
    let f = Fixture::new();

    assert!(f.subwindow.show_select_overlay(NodeRef::new(40, "SelectOverlay")));

    assert_eq!(f.root_tags(), vec!["SelectOverlay"]);
    assert!(!f.window().focusable());
    let mounted = f
        .backend
        .recorder
        .last(&format!("pipeline:{}", f.subwindow.child_container_id()), "mount_to_root")
        .unwrap();
    assert_eq!(mounted.scope, f.subwindow.child_container_id());
}

#[test]
fn legacy_popup_and_menu_use_the_stack() {
    let backend = SimBackend::new();
    backend.containers.set_child_pipeline_kind(subwm::pipeline::PipelineKind::Legacy);
    let f = Fixture::with_backend(backend, ParentSpec::new(1).legacy());

    f.subwindow
        .show_popup(ComponentRef::new("tip", ComponentKind::Popup), false);
    let stack = Arc::clone(f.child().memory_pipeline().stack().unwrap());
    assert_eq!(stack.components().len(), 1);
    assert!(f.subwindow.cancel_popup("tip"));
    assert!(stack.components().is_empty());

    f.subwindow
        .show_menu(ComponentRef::new("select", ComponentKind::SelectPopup));
    assert_eq!(stack.components().len(), 1);
    f.subwindow.close_menu();
    f.subwindow.clear_menu();
    assert!(stack.components().is_empty());
    assert!(!f.subwindow.is_showed());
}
