//! Status command - devices, access and secret files.

use serde::Serialize;

use crate::cli::{output, register};
use crate::core::context::Context;
use crate::core::domain::{Device, DeviceStatus};
use crate::core::vault::Vault;
use crate::error::Result;

#[derive(Serialize)]
struct StatusView {
    project: String,
    id: String,
    /// This machine's device, if it has one for the project
    device: Option<String>,
    access: bool,
    devices: Vec<Device>,
    files: Vec<FileView>,
}

#[derive(Serialize)]
struct FileView {
    path: String,
    plaintext: bool,
    ciphertext: bool,
}

/// Show project status.
pub fn execute(ctx: &Context, json: bool) -> Result<()> {
    let vault = Vault::open(ctx)?;
    let view = collect(&vault)?;

    if json {
        return output::json(&view);
    }

    output::header(&format!("{} ({})", view.project, view.id));
    match &view.device {
        Some(device) if view.access => {
            output::kv("this device", format!("{} (access)", output::device(device)))
        }
        Some(device) => output::kv("this device", format!("{} (no access)", output::device(device))),
        None => output::kv("this device", "none"),
    }

    output::section("Devices");
    if view.devices.is_empty() {
        output::dimmed("  none");
    }
    for device in &view.devices {
        output::list_item(&format!("{:<8} {}", device.status, register::describe(device)));
    }

    output::section("Files");
    if view.files.is_empty() {
        output::dimmed("  none");
    }
    for file in &view.files {
        let state = match (file.plaintext, file.ciphertext) {
            (true, true) => "both",
            (false, true) => "encrypted",
            (true, false) => "plaintext only",
            (false, false) => "missing",
        };
        output::list_item(&format!("{:<15} {}", state, output::path(&file.path)));
    }

    let pending = view
        .devices
        .iter()
        .filter(|d| d.status == DeviceStatus::Pending)
        .count();
    if pending > 0 && view.access {
        println!();
        output::hint(&format!("{pending} device(s) pending: cellar register <device>"));
    }
    Ok(())
}

fn collect(vault: &Vault<'_>) -> Result<StatusView> {
    let ctx = vault.context();
    let project = vault.project_id();
    let device = ctx.store().device_id(project)?;
    let access = device
        .as_deref()
        .is_some_and(|d| vault.status(d) == DeviceStatus::Active);

    let mut files: Vec<FileView> = vault
        .layout()
        .secret_files()?
        .into_iter()
        .map(|f| FileView {
            path: vault.layout().relative(f.plaintext()),
            plaintext: f.has_plaintext(),
            ciphertext: f.has_ciphertext(),
        })
        .collect();
    for tracked in &vault.registry().files {
        if !files.iter().any(|f| &f.path == tracked) {
            let file = vault.layout().secret_file(tracked);
            files.push(FileView {
                path: tracked.clone(),
                plaintext: file.has_plaintext(),
                ciphertext: file.has_ciphertext(),
            });
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(StatusView {
        project: vault.registry().project.name.clone(),
        id: project.to_string(),
        device,
        access,
        devices: vault.devices()?,
        files,
    })
}
