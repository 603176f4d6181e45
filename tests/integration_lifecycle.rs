use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use subwm::InitError;
use subwm::constants::{MIN_SUBCONTAINER_ID, SUBWINDOW_NAME_PREFIX};
use subwm::container::Container;
use subwm::error::WmError;
use subwm::manager::SubwindowKind;
use subwm::sim::{MemoryWindow, ParentSpec, SimBackend};
use subwm::subwindow::{Subwindow, SubwindowOptions};
use subwm::window::{Window, WindowFlag, WindowRect, WindowType};

fn child_window(backend: &SimBackend, subwindow: &Subwindow) -> Arc<MemoryWindow> {
    let id = subwindow.window().expect("subwindow window").window_id();
    backend.windows.window(id).expect("memory window")
}

#[test]
fn app_main_parent_gets_app_sub_window() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let parent_window = backend.parent_window(5).unwrap();

    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");

    let window = child_window(&backend, &subwindow);
    assert_eq!(window.option().window_type, WindowType::AppSubWindow);
    assert_eq!(window.option().parent_id, Some(parent_window.window_id()));
    assert!(window.window_name().starts_with(SUBWINDOW_NAME_PREFIX));
    assert!(window.window_name().contains("main_window_5"));
    assert_eq!(subwindow.child_container_id(), MIN_SUBCONTAINER_ID);
    assert!(Arc::ptr_eq(
        &backend.platform().manager.subwindow(5).unwrap(),
        &subwindow
    ));
    assert_eq!(
        backend.platform().manager.parent_container_id(MIN_SUBCONTAINER_ID),
        Some(5)
    );
}

#[test]
fn child_container_is_wired_to_parent() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");

    let child = backend
        .containers
        .memory_container(subwindow.child_container_id())
        .unwrap();
    let config = child.sub_config().expect("configured as sub container");
    assert_eq!(config.parent_id, 5);
    assert!(child.ui_window().is_some());
    assert_eq!(child.view().unwrap().width, 1080);
    assert_eq!(child.memory_pipeline().parent_pipeline(), Some(5));

    let window = child_window(&backend, &subwindow);
    assert!(window.has_content());
    assert!(window.has_listener());
    let ops = backend
        .recorder
        .ops_for(&format!("window:{}", window.window_id()));
    assert!(ops.contains(&"set_avoid_area_option 3".to_string()));
}

#[test]
fn ui_extension_parent_without_host_rect_creates_nothing() {
    let backend = SimBackend::new();
    backend.add_parent(
        ParentSpec::new(5)
            .window_type(WindowType::UiExtension)
            .flags(|flags| flags.ui_extension = true),
    );

    let err = Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).unwrap_err();

    assert!(matches!(err, InitError::HostWindowNotReady(_)));
    assert!(backend.windows.windows_with_prefix(SUBWINDOW_NAME_PREFIX).is_empty());
    assert_eq!(backend.recorder.count("windows", "create"), 0);
    assert!(backend.platform().manager.subwindow(5).is_none());
}

#[test]
fn ui_extension_parent_is_hosted_once_host_is_ready() {
    let backend = SimBackend::new();
    backend.add_parent(
        ParentSpec::new(5)
            .window_type(WindowType::UiExtension)
            .flags(|flags| flags.ui_extension = true),
    );
    let parent_window = backend.parent_window(5).unwrap();
    parent_window.set_host_rect(WindowRect::new(0, 0, 720, 1280));

    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");

    let window = child_window(&backend, &subwindow);
    assert!(window.option().ui_ext_first_sub_window);
    // host is the window focused on behalf of the parent pipeline
    assert_eq!(window.option().parent_id, Some(parent_window.window_id()));
    assert_eq!(
        subwindow.ui_extension_host_window_id(),
        Some(parent_window.window_id())
    );
    assert!(subwindow.check_host_window_status());
    assert_eq!(subwindow.ui_extension_host_window_rect().width, 720.0);
}

#[test]
fn kind_depends_on_parent_and_options() {
    let cases = [
        (WindowType::SystemFloat, SubwindowOptions::default(), WindowType::SystemSubWindow),
        (WindowType::Desktop, SubwindowOptions::default(), WindowType::SystemFloat),
        (
            WindowType::AppMainWindow,
            SubwindowOptions {
                system_top_most: true,
                ..SubwindowOptions::default()
            },
            WindowType::SystemToast,
        ),
        (
            WindowType::AppMainWindow,
            SubwindowOptions {
                above_apps: true,
                ..SubwindowOptions::default()
            },
            WindowType::Toast,
        ),
    ];
    for (parent_type, options, expected) in cases {
        for _ in 0..2 {
            let backend = SimBackend::new();
            backend.add_parent(ParentSpec::new(5).window_type(parent_type));
            let subwindow =
                Subwindow::create(backend.platform(), 5, options.clone()).expect("init");
            assert_eq!(
                child_window(&backend, &subwindow).option().window_type,
                expected,
                "parent {parent_type:?} options {options:?}"
            );
        }
    }
}

#[test]
fn select_overlay_under_scene_board_is_text_menu() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5).flags(|flags| flags.scene_board_enabled = true));
    let options = SubwindowOptions {
        above_apps: true,
        select_overlay: true,
        ..SubwindowOptions::default()
    };

    let subwindow = Subwindow::create(backend.platform(), 5, options).expect("init");

    let window = child_window(&backend, &subwindow);
    assert_eq!(window.option().window_type, WindowType::AppSubWindow);
    assert_eq!(window.option().flags, vec![WindowFlag::IsTextMenu]);
    assert!(window.window_name().contains("TEXT_MENU_"));
    assert!(
        backend
            .platform()
            .manager
            .subwindow_of_kind(5, SubwindowKind::Toast)
            .is_some()
    );
}

#[test]
fn missing_parent_fails_init() {
    let backend = SimBackend::new();
    let err = Subwindow::create(backend.platform(), 42, SubwindowOptions::default()).unwrap_err();
    assert_eq!(err, InitError::ParentContainerMissing(42));
    assert!(backend.windows.is_empty());
}

#[test]
fn window_service_failure_surfaces() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    backend.windows.fail_create(Some(WmError::NoPermission));

    let err = Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).unwrap_err();

    assert_eq!(err, InitError::WindowCreate(WmError::NoPermission));
    assert!(backend.platform().manager.subwindow(5).is_none());
}

#[test]
fn init_container_is_idempotent() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");

    subwindow.init_container().expect("second init");

    assert_eq!(backend.recorder.count("windows", "create"), 1);
    assert_eq!(backend.containers.children_created(), 1);
}

#[test]
fn close_unregisters_and_destroys_once() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");
    subwindow.show_window(false).expect("show");
    let window = child_window(&backend, &subwindow);

    assert!(subwindow.close());

    assert!(window.is_destroyed());
    assert!(!window.has_listener());
    assert!(!subwindow.is_showed());
    let child = backend
        .containers
        .memory_container(subwindow.child_container_id())
        .unwrap();
    assert!(child.ui_window().is_none());
    // destroyed windows reject the second attempt
    assert!(!subwindow.close());
}

#[test]
fn free_multi_window_switch_reaches_callbacks() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let first = subwindow.register_free_multi_window_switch_callback(Arc::new(move |enable| {
        sink.lock().unwrap().push(enable);
    }));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let second = subwindow.register_free_multi_window_switch_callback(Arc::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!((first, second), (1, 2));

    let window = child_window(&backend, &subwindow);
    window.switch_free_multi_window(true);
    subwindow.unregister_free_multi_window_switch_callback(second);
    window.switch_free_multi_window(false);

    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // nothing follows the parent layout, so the window spans the display
    assert!(!window.follows_parent_layout());
}

#[test]
fn follow_parent_layout_tracks_nodes() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");
    let window = child_window(&backend, &subwindow);

    subwindow.add_follow_parent_window_layout_node(11);
    assert!(window.follows_parent_layout());
    subwindow.add_follow_parent_window_layout_node(12);
    subwindow.remove_follow_parent_window_layout_node(11);
    assert!(window.follows_parent_layout());
    subwindow.remove_follow_parent_window_layout_node(12);
    assert!(!window.follows_parent_layout());
}

#[test]
fn container_destroyed_drops_registrations() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(5));
    let subwindow =
        Subwindow::create(backend.platform(), 5, SubwindowOptions::default()).expect("init");
    let manager = backend.platform().manager;
    let child_id = subwindow.child_container_id();

    manager.on_container_destroyed(5);

    assert!(manager.subwindow(5).is_none());
    assert_eq!(manager.parent_container_id(child_id), None);
}
