use std::io::Write as _;
use std::sync::{Arc, Mutex};

use subwm::config::AppConfiguration;
use subwm::constants::{MIN_PA_SERVICE_ID, MIN_SUBCONTAINER_ID, TOAST_DIALOG_NAME_PREFIX, TOAST_DIALOG_RUNNER_NAME};
use subwm::frontend::DialogRequest;
use subwm::overlay::{ButtonInfo, PromptDialogAttr, ToastInfo, ToastShowMode};
use subwm::sim::{MemoryWindow, ParentSpec, SimBackend};
use subwm::subwindow::{Subwindow, SubwindowOptions};
use subwm::window::{Window, WindowType};
use subwm::error::WmError;
use subwm::ConfigError;

fn toast(message: &str) -> ToastInfo {
    ToastInfo {
        message: message.to_string(),
        duration_ms: 1500,
        show_mode: ToastShowMode::Default,
    }
}

fn toast_windows(backend: &SimBackend) -> Vec<Arc<MemoryWindow>> {
    backend.windows.windows_with_prefix(TOAST_DIALOG_NAME_PREFIX)
}

#[test]
fn service_toast_runs_on_dedicated_loop() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), -1);
    let (tx, rx) = std::sync::mpsc::channel();

    subwindow.show_toast(
        toast("saved"),
        Box::new(move |id| {
            let _ = tx.send((id, std::thread::current().name().map(str::to_string)));
        }),
    );
    assert!(subwindow.sync_service_loop());

    let (toast_id, thread) = rx.recv().unwrap();
    assert_eq!(toast_id, 1);
    assert_eq!(thread.as_deref(), Some(TOAST_DIALOG_RUNNER_NAME));

    let windows = toast_windows(&backend);
    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    assert_eq!(window.window_name(), format!("{TOAST_DIALOG_NAME_PREFIX}0"));
    assert_eq!(window.option().window_type, WindowType::Toast);
    assert!(window.is_shown());
    assert!(!window.is_touchable());

    assert_eq!(subwindow.child_container_id(), MIN_SUBCONTAINER_ID);
    let shown = backend
        .recorder
        .last(&format!("frontend:{MIN_SUBCONTAINER_ID}"), "show_toast")
        .unwrap();
    assert_eq!(shown.op, "show_toast saved");
    assert_eq!(shown.scope, MIN_SUBCONTAINER_ID);
    assert_eq!(shown.thread.as_deref(), Some(TOAST_DIALOG_RUNNER_NAME));

    let current = backend.platform().manager.current_dialog_window(-1).unwrap();
    assert!(Arc::ptr_eq(&current, &subwindow));
    assert!(subwindow.is_toast_window());
}

#[test]
fn service_toasts_keep_posting_order_and_reuse_window() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), MIN_PA_SERVICE_ID);
    let ids = Arc::new(Mutex::new(Vec::new()));

    for message in ["a", "b", "c"] {
        let ids = Arc::clone(&ids);
        subwindow.show_toast(
            toast(message),
            Box::new(move |id| ids.lock().unwrap().push(id)),
        );
    }
    subwindow.sync_service_loop();

    let frontend = backend
        .containers
        .memory_container(subwindow.child_container_id())
        .unwrap()
        .recording_frontend()
        .clone();
    let messages: Vec<String> = frontend.toasts().into_iter().map(|t| t.message).collect();
    assert_eq!(messages, vec!["a", "b", "c"]);
    assert_eq!(*ids.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(toast_windows(&backend).len(), 1);
    assert_eq!(backend.containers.children_created(), 1);
}

#[test]
fn service_toast_registers_dialog_subwindow_before_it_runs() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), -1);

    subwindow.show_toast(toast("saved"), Box::new(|_| {}));

    let current = backend.platform().manager.current_dialog_window(-1).unwrap();
    assert!(Arc::ptr_eq(&current, &subwindow));
    subwindow.sync_service_loop();
}

#[test]
fn failed_toast_window_keeps_dialog_subwindow_registered() {
    let backend = SimBackend::new();
    backend.windows.fail_create(Some(WmError::NoPermission));
    let subwindow = Subwindow::new(backend.platform(), -1);

    subwindow.show_toast(toast("saved"), Box::new(|_| {}));
    assert!(subwindow.sync_service_loop());

    assert!(toast_windows(&backend).is_empty());
    assert!(!subwindow.is_toast_window());
    let current = backend.platform().manager.current_dialog_window(-1).unwrap();
    assert!(Arc::ptr_eq(&current, &subwindow));
}

#[test]
fn dialog_queued_behind_toast_clears_toast_flag() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), -1);

    subwindow.show_toast(toast("saved"), Box::new(|_| {}));
    subwindow.show_dialog(
        DialogRequest {
            title: "confirm".to_string(),
            ..DialogRequest::default()
        },
        Box::new(|_, _| {}),
    );
    subwindow.sync_service_loop();

    assert!(!subwindow.is_toast_window());
    let windows = toast_windows(&backend);
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[1].option().window_type, WindowType::AppMainWindow);
}

#[test]
fn sync_without_loop_reports_false() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), -1);
    assert!(!subwindow.sync_service_loop());
}

#[test]
fn service_toast_closes_through_dialog_container() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), -1);
    subwindow.show_toast(toast("saved"), Box::new(|_| {}));
    subwindow.sync_service_loop();
    let (tx, rx) = std::sync::mpsc::channel();

    subwindow.close_toast(
        1,
        Box::new(move |id| {
            let _ = tx.send(id);
        }),
    );

    assert_eq!(rx.recv().unwrap(), 1);
    let closed = backend
        .recorder
        .last(&format!("frontend:{MIN_SUBCONTAINER_ID}"), "close_toast")
        .unwrap();
    assert_eq!(closed.scope, MIN_SUBCONTAINER_ID);
}

#[test]
fn service_dialog_gets_focusable_main_window() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), -1);
    let answers = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&answers);

    subwindow.show_dialog(
        DialogRequest {
            title: "confirm".to_string(),
            ..DialogRequest::default()
        },
        Box::new(move |event, index| sink.lock().unwrap().push((event, index))),
    );
    subwindow.sync_service_loop();

    let windows = toast_windows(&backend);
    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    assert_eq!(window.option().window_type, WindowType::AppMainWindow);
    assert!(window.option().focusable);
    assert!(window.is_shown());
    assert!(window.is_focused());
    assert!(!subwindow.is_toast_window());
    assert_eq!(*answers.lock().unwrap(), vec![(0, 0)]);

    let frontend = backend
        .containers
        .memory_container(subwindow.child_container_id())
        .unwrap()
        .recording_frontend()
        .clone();
    assert_eq!(frontend.dialogs(), vec!["confirm"]);
}

#[test]
fn service_action_menu_and_attr_dialog_each_get_a_window() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), MIN_PA_SERVICE_ID + 1);
    let buttons = vec![
        ButtonInfo {
            text: "copy".to_string(),
            text_color: "#000000".to_string(),
        },
        ButtonInfo {
            text: "share".to_string(),
            text_color: "#000000".to_string(),
        },
    ];

    subwindow.show_action_menu("actions".to_string(), buttons.clone(), Box::new(|_, _| {}));
    subwindow.show_dialog_with_attr(
        PromptDialogAttr {
            title: "prompt".to_string(),
            ..PromptDialogAttr::default()
        },
        buttons,
        Box::new(|_, _| {}),
        Default::default(),
    );
    subwindow.sync_service_loop();

    assert_eq!(toast_windows(&backend).len(), 2);
    let ops: Vec<String> = backend
        .recorder
        .events()
        .into_iter()
        .filter(|event| event.target.starts_with("frontend:"))
        .map(|event| event.op)
        .collect();
    assert_eq!(
        ops,
        vec![
            "show_action_menu actions buttons=2".to_string(),
            "show_dialog_with_attr prompt buttons=2".to_string(),
        ]
    );
}

#[test]
fn custom_dialog_is_refused_for_services() {
    let backend = SimBackend::new();
    let subwindow = Subwindow::new(backend.platform(), MIN_PA_SERVICE_ID);
    let (tx, rx) = std::sync::mpsc::channel::<i32>();

    subwindow.open_custom_dialog(
        PromptDialogAttr::default(),
        Box::new(move |id| {
            let _ = tx.send(id);
        }),
    );

    assert!(rx.try_recv().is_err());
    assert!(backend.recorder.events().is_empty());
    assert!(!subwindow.sync_service_loop());
}

#[test]
fn ability_top_most_toast_uses_child_frontend() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(1));
    let subwindow =
        Subwindow::create(backend.platform(), 1, SubwindowOptions::default()).expect("init");
    let child_id = subwindow.child_container_id();

    subwindow.show_toast(
        ToastInfo {
            show_mode: ToastShowMode::TopMost,
            ..toast("copied")
        },
        Box::new(|_| {}),
    );

    let shown = backend
        .recorder
        .last(&format!("frontend:{child_id}"), "show_toast")
        .unwrap();
    assert_eq!(shown.scope, child_id);
    assert_ne!(shown.thread.as_deref(), Some(TOAST_DIALOG_RUNNER_NAME));
    assert!(toast_windows(&backend).is_empty());
    assert!(subwindow.is_toast_window());
    assert!(subwindow.is_showed());

    let window = backend
        .windows
        .window(subwindow.window().unwrap().window_id())
        .unwrap();
    assert!(!window.is_touchable());
    assert!(backend.platform().manager.current_window(1).is_none());
}

#[test]
fn ability_dialog_marks_subwindow_current() {
    let backend = SimBackend::new();
    backend.add_parent(ParentSpec::new(1));
    let subwindow =
        Subwindow::create(backend.platform(), 1, SubwindowOptions::default()).expect("init");

    subwindow.show_dialog(
        DialogRequest {
            title: "delete?".to_string(),
            ..DialogRequest::default()
        },
        Box::new(|_, _| {}),
    );

    let frontend = backend
        .containers
        .memory_container(subwindow.child_container_id())
        .unwrap()
        .recording_frontend()
        .clone();
    assert_eq!(frontend.dialogs(), vec!["delete?"]);
    let current = backend.platform().manager.current_window(1).unwrap();
    assert!(Arc::ptr_eq(&current, &subwindow));
}

#[test]
fn font_configuration_reaches_toast_pipeline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "# font settings\nohos.application.fontSizeScale = followSystem\nohos.application.fontSizeMaxScale = 1.75\n\nohos.system.fontSizeScale = 1.5"
    )
    .unwrap();
    let config = AppConfiguration::load(file.path()).unwrap();
    assert_eq!(config.len(), 3);
    let backend = SimBackend::new().with_app_configuration(config);
    let subwindow = Subwindow::new(backend.platform(), -1);

    subwindow.show_toast(toast("hello"), Box::new(|_| {}));
    subwindow.sync_service_loop();

    let settings = backend
        .containers
        .memory_container(subwindow.child_container_id())
        .unwrap()
        .memory_pipeline()
        .settings();
    assert!(settings.follow_system);
    assert_eq!(settings.max_app_font_scale, 1.75);
    assert_eq!(settings.font_scale, 1.5);
}

#[test]
fn malformed_configuration_names_the_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ohos.system.fontSizeScale = 1.0\nnot a pair").unwrap();

    let err = AppConfiguration::load(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { line: 2, .. }));
}
