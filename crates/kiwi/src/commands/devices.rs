//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use kiwi_core::{Dashboard, Device, DeviceForm, DeviceUpdateForm};

use crate::cli::{DeviceFields, DeviceUpdateFields, DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "TX Power")]
    tx_power: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Added")]
    added: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            mac: d.mac.to_string(),
            tx_power: format!("{} dBm", d.tx_power),
            dtype: d.device_type.to_string(),
            status: d.status.to_string(),
            added: d.add_date.format("%Y-%m-%d").to_string(),
        }
    }
}

fn detail(d: &Arc<Device>, color: bool) -> String {
    [
        format!("ID:       {}", d.id),
        format!("Name:     {}", d.name),
        format!("MAC:      {}", d.mac),
        format!("TX Power: {} dBm", d.tx_power),
        format!("Type:     {}", d.device_type),
        format!("Status:   {}", output::status_label(d.status, color)),
        format!("Added:    {}", d.add_date.format("%Y-%m-%d %H:%M:%S UTC")),
    ]
    .join("\n")
}

fn print_device(device: &Arc<Device>, resolved: &Resolved, global: &GlobalOpts) {
    let color = output::should_color(global.color);
    let out = output::render_single(
        resolved.output,
        device,
        |d| detail(d, color),
        |d| d.id.to_string(),
    );
    output::print_output(&out, global.quiet);
}

fn create_form(fields: DeviceFields) -> DeviceForm {
    DeviceForm {
        name: fields.name,
        mac: fields.mac,
        tx_power: fields.tx_power,
        device_type: fields.device_type,
        status: fields.status,
    }
}

fn update_form(fields: DeviceUpdateFields) -> DeviceUpdateForm {
    DeviceUpdateForm {
        name: fields.name,
        mac: fields.mac,
        tx_power: fields.tx_power,
        device_type: fields.device_type,
        status: fields.status,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: DevicesArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Input is checked before the session is restored.
    let registry = dashboard.registry();
    match args.command {
        DevicesCommand::List { search } => {
            util::require_session(dashboard, resolved, global).await?;
            let query = search.unwrap_or_default();
            util::with_spinner(global, "Loading devices", registry.search(&query)).await;
            if let Some(err) = registry.last_error() {
                return Err(err.into());
            }

            let snapshot = registry.snapshot();
            let out = output::render_list(
                resolved.output,
                &snapshot,
                |d| DeviceRow::from(d),
                |d| d.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { id } => {
            let id = util::device_id(&id)?;
            util::require_session(dashboard, resolved, global).await?;
            let device =
                util::with_spinner(global, "Loading device", registry.get_by_id(&id)).await?;
            print_device(&device, resolved, global);
            Ok(())
        }

        DevicesCommand::Create(fields) => {
            let draft = create_form(fields).validate()?;
            util::require_session(dashboard, resolved, global).await?;
            let device =
                util::with_spinner(global, "Registering device", registry.create(&draft)).await?;
            print_device(&device, resolved, global);
            output::success(global, &format!("Device '{}' created", device.name));
            Ok(())
        }

        DevicesCommand::Update { id, fields } => {
            let id = util::device_id(&id)?;
            let update = update_form(fields).validate()?;
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "fields".into(),
                    reason: "nothing to update; pass at least one of --name, --mac, \
                             --tx-power, --type, --status"
                        .into(),
                });
            }
            util::require_session(dashboard, resolved, global).await?;
            let device =
                util::with_spinner(global, "Saving device", registry.update(&id, &update)).await?;
            print_device(&device, resolved, global);
            output::success(global, &format!("Device '{}' updated", device.id));
            Ok(())
        }

        DevicesCommand::Delete { id } => {
            let id = util::device_id(&id)?;
            if !util::confirm(&format!("Delete device {id}?"), "devices delete", global.yes)? {
                return Ok(());
            }
            util::require_session(dashboard, resolved, global).await?;
            util::with_spinner(global, "Deleting device", registry.delete(&id)).await?;
            output::success(global, &format!("Device '{id}' deleted"));
            Ok(())
        }
    }
}
