//! Register command - grant devices access to the project key.

use crate::cli::{output, RegisterArgs};
use crate::core::constants;
use crate::core::context::Context;
use crate::core::domain::Device;
use crate::core::vault::Vault;
use crate::error::{Result, ValidationError};

/// Register a device, every pending device of a user, or a key file.
pub fn execute(ctx: &Context, args: &RegisterArgs) -> Result<()> {
    validate(args)?;

    let mut vault = Vault::open(ctx)?;
    let granter = vault.identity()?;

    let registered = if let Some(device) = &args.device {
        vec![vault.register(&granter, device, args.force)?]
    } else if let Some(email) = &args.user {
        vault.register_user(&granter, email, args.force)?
    } else if let (Some(path), Some(email)) = (&args.key_file, &args.email) {
        vec![vault.register_key_file(&granter, path, email, args.name.as_deref(), args.force)?]
    } else {
        Vec::new()
    };

    for device in &registered {
        output::success(&format!("registered {}", describe(device)));
    }
    println!();
    output::hint(&format!(
        "commit {} so they can decrypt",
        constants::STORE_DIR
    ));
    Ok(())
}

fn validate(args: &RegisterArgs) -> Result<()> {
    let modes = [
        args.device.is_some(),
        args.user.is_some(),
        args.key_file.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if modes != 1 {
        return Err(ValidationError::ConflictingOptions(
            "pass exactly one of <DEVICE>, --user or --key-file".to_string(),
        )
        .into());
    }
    if args.key_file.is_none() && (args.email.is_some() || args.name.is_some()) {
        return Err(ValidationError::ConflictingOptions(
            "--email and --name only apply to --key-file".to_string(),
        )
        .into());
    }
    if args.key_file.is_some() && args.email.is_none() {
        return Err(
            ValidationError::ConflictingOptions("--key-file requires --email".to_string()).into(),
        );
    }
    Ok(())
}

/// `id (name <email>)`, or just the id for unregistered devices.
pub(crate) fn describe(device: &Device) -> String {
    let id = output::device(&device.id);
    match (&device.name, &device.email) {
        (Some(name), Some(email)) => format!("{id} ({name} <{email}>)"),
        (None, Some(email)) => format!("{id} ({email})"),
        _ => id,
    }
}
