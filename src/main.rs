use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use indoc::indoc;
use tracing::Level;

use subwm::config::{AppConfiguration, DeviceOrientation, SystemProperties};
use subwm::constants::MIN_PA_SERVICE_ID;
use subwm::frontend::DialogRequest;
use subwm::geometry::{OffsetF, Rect};
use subwm::overlay::{DialogProperties, MenuParam, NodeRef, PopupInfo, ToastInfo, ToastShowMode};
use subwm::sim::{ParentSpec, SimBackend};
use subwm::subwindow::{Subwindow, SubwindowOptions};
use subwm::window::{DisplayInfo, WindowRect, WindowType};
use subwm::tracing_sub::{self, LogCapture};
use subwm::InitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Popup,
    Menu,
    Dialog,
    ToastService,
    ToastAbility,
    UiExtension,
    HotAreas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ParentWindow {
    Main,
    Sub,
    System,
    Desktop,
    UiExtension,
}

impl From<ParentWindow> for WindowType {
    fn from(kind: ParentWindow) -> Self {
        match kind {
            ParentWindow::Main => WindowType::AppMainWindow,
            ParentWindow::Sub => WindowType::AppSubWindow,
            ParentWindow::System => WindowType::SystemFloat,
            ParentWindow::Desktop => WindowType::Desktop,
            ParentWindow::UiExtension => WindowType::UiExtension,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "subwm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Runs subwindow scenarios against the in-memory window service",
    after_help = indoc! {"
        Every window, container and overlay call made by the scenario is
        printed in order, one per line:

            <target> [scope=<container>] <operation>

        Examples:
            subwm popup
            subwm toast-service --config app.conf
            subwm menu --landscape --display 2224x1668
            subwm dialog --buffer-logs --log-level debug
    "}
)]
struct Cli {
    /// Scenario to run.
    #[arg(value_enum)]
    scenario: Scenario,

    /// Container id of the parent. Ids at or above 100000 act as services.
    #[arg(long = "parent-id", default_value_t = 1)]
    parent_id: i32,

    /// Window type of the parent's main window.
    #[arg(long = "window-type", value_enum, default_value_t = ParentWindow::Main)]
    window_type: ParentWindow,

    /// Display size as WIDTHxHEIGHT.
    #[arg(long = "display", value_name = "WxH", value_parser = parse_display, default_value = "1080x2340")]
    display: (u32, u32),

    /// Device is held in landscape.
    #[arg(long)]
    landscape: bool,

    /// Application configuration file (`key = value` lines).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level written to stderr.
    #[arg(long = "log-level", default_value_t = Level::WARN)]
    log_level: Level,

    /// Collect log lines and print them after the event listing instead of
    /// writing them to stderr as they happen.
    #[arg(long)]
    buffer_logs: bool,
}

fn parse_display(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width = w.trim().parse().map_err(|_| format!("bad width `{w}`"))?;
    let height = h.trim().parse().map_err(|_| format!("bad height `{h}`"))?;
    if width == 0 || height == 0 {
        return Err("display size must be non-zero".to_string());
    }
    Ok((width, height))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let capture = cli.buffer_logs.then(LogCapture::default);
    if let Some(capture) = &capture {
        tracing_sub::install_capture(capture.clone());
    }
    tracing_sub::init_default(cli.log_level);

    let (width, height) = cli.display;
    let mut backend = SimBackend::with_display(DisplayInfo {
        id: 0,
        width,
        height,
        virtual_pixel_ratio: 3.0,
    })
    .with_system_properties(SystemProperties {
        orientation: if cli.landscape {
            DeviceOrientation::Landscape
        } else {
            DeviceOrientation::Portrait
        },
        ..SystemProperties::default()
    });
    if let Some(path) = &cli.config {
        match AppConfiguration::load(path) {
            Ok(config) => backend = backend.with_app_configuration(config),
            Err(err) => {
                eprintln!("subwm: {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let result = run(&cli, &backend);
    print_events(&backend);
    if let Some(capture) = &capture {
        println!();
        for line in capture.lines() {
            println!("{line}");
        }
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("subwm: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, backend: &SimBackend) -> Result<(), InitError> {
    let platform = backend.platform();
    match cli.scenario {
        Scenario::ToastService => {
            let parent_id = cli.parent_id.max(MIN_PA_SERVICE_ID);
            let subwindow = Subwindow::new(platform, parent_id);
            subwindow.show_toast(
                ToastInfo {
                    message: "saved".to_string(),
                    duration_ms: 1500,
                    show_mode: ToastShowMode::Default,
                },
                Box::new(|id| tracing::info!(toast_id = id, "toast shown")),
            );
            subwindow.show_dialog(
                DialogRequest {
                    title: "confirm".to_string(),
                    ..DialogRequest::default()
                },
                Box::new(|event, index| tracing::info!(event, index, "dialog answered")),
            );
            subwindow.sync_service_loop();
            return Ok(());
        }
        Scenario::UiExtension => {
            backend.add_parent(
                ParentSpec::new(cli.parent_id)
                    .window_type(WindowType::UiExtension)
                    .flags(|flags| flags.ui_extension = true),
            );
            if let Some(window) = backend.parent_window(cli.parent_id) {
                window.set_host_rect(WindowRect::new(0, 0, 720, 1280));
            }
        }
        _ => {
            backend.add_parent(ParentSpec::new(cli.parent_id).window_type(cli.window_type.into()));
        }
    }

    let subwindow = Subwindow::create(platform, cli.parent_id, SubwindowOptions::default())?;
    let target = NodeRef::new(7, "Button");
    match cli.scenario {
        Scenario::Popup | Scenario::UiExtension => {
            let info = PopupInfo {
                focusable: true,
                ..PopupInfo::default()
            };
            subwindow.show_popup_ng(target.id, &info, None, false);
            subwindow.hide_popup_ng(-1);
        }
        Scenario::Menu => {
            subwindow.show_menu_ng_with_builder(
                Box::new(|| Some(NodeRef::new(20, "Menu"))),
                None,
                &MenuParam::default(),
                Some(&target),
                OffsetF::new(10.0, 10.0),
            );
            subwindow.hide_menu_ng(false, false);
        }
        Scenario::Dialog => {
            let dialog = subwindow.show_dialog_ng(
                &DialogProperties::default(),
                Box::new(|| Some(NodeRef::new(30, "Column"))),
            );
            if let Some(dialog) = dialog {
                subwindow.close_dialog_ng(&dialog);
            }
            subwindow.hide_window();
        }
        Scenario::ToastAbility => {
            subwindow.show_toast(
                ToastInfo {
                    message: "copied".to_string(),
                    duration_ms: 1500,
                    show_mode: ToastShowMode::TopMost,
                },
                Box::new(|id| tracing::info!(toast_id = id, "toast shown")),
            );
        }
        Scenario::HotAreas => {
            subwindow.set_hot_areas(&[Rect::new(0.0, 0.0, 100.0, 50.0)], 1);
            subwindow.set_hot_areas(&[Rect::new(10.0, 600.0, 300.0, 200.0)], 2);
            subwindow.delete_hot_areas(1);
            subwindow.delete_hot_areas(2);
        }
        Scenario::ToastService => {}
    }
    subwindow.close();
    Ok(())
}

fn print_events(backend: &SimBackend) {
    for event in backend.recorder.events() {
        println!("{:<14} [scope={}] {}", event.target, event.scope, event.op);
    }
}
