//! Frontend delegate reached through a container.
//!
//! Toast, dialog and action-menu requests end up here once the coordinator
//! has picked the container that should present them.

use std::collections::BTreeSet;

use crate::overlay::{
    ButtonInfo, CustomDialogCallback, DialogCallback, PromptDialogAttr, ToastCallback, ToastInfo,
};

/// Plain alert dialog request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialogRequest {
    pub title: String,
    pub message: String,
    pub buttons: Vec<ButtonInfo>,
    pub auto_cancel: bool,
    /// Names of the callbacks the caller listens to (`success`, `cancel`, ..).
    pub callbacks: BTreeSet<String>,
}

pub trait Frontend: Send + Sync {
    fn show_toast(&self, info: ToastInfo, callback: ToastCallback);
    fn close_toast(&self, toast_id: i32, callback: ToastCallback);
    fn show_dialog(&self, request: DialogRequest, callback: DialogCallback);
    fn show_dialog_with_attr(
        &self,
        attr: PromptDialogAttr,
        buttons: Vec<ButtonInfo>,
        callback: DialogCallback,
        callbacks: BTreeSet<String>,
    );
    fn show_action_menu(&self, title: String, buttons: Vec<ButtonInfo>, callback: DialogCallback);
    fn open_custom_dialog(&self, attr: PromptDialogAttr, callback: CustomDialogCallback);
}
