//! # Server Configuration Patcher
//!
//! Registers (or rolls back) module entries inside a server configuration's
//! `profile → subsystem(ee) → global-modules` element. The patcher owns
//! mutation of the shared configuration document and never touches module
//! directories.
//!
//! All descent and mutation goes through the find-or-create primitive, so
//! patching is idempotent: a registration that is already present is left
//! byte-for-byte alone, and under `REPLACE` the element's children are
//! resynced to exactly the desired set.

use crate::config::WriteMode;
use crate::error::{Error, Result};
use crate::module::ModuleRef;
use crate::xml::{self, ChildSpec};
use log::{debug, info};
use std::path::Path;
use xot::Xot;

/// Namespace prefix identifying the ee subsystem, any version.
pub const EE_SUBSYSTEM_NAMESPACE: &str = "urn:jboss:domain:ee";

/// Namespace stamped on an ee subsystem this patcher has to create itself.
const EE_SUBSYSTEM_CREATE_NAMESPACE: &str = "urn:jboss:domain:ee:2.0";

/// Patch one configuration file so `global-modules` carries the desired
/// registrations.
///
/// With `is_global` false, an entry this call just created is immediately
/// removed again: the document passes through the same descent and diffing
/// but keeps zero new registrations.
pub fn patch(
    path: &Path,
    registrations: &[ModuleRef],
    write_mode: WriteMode,
    is_global: bool,
) -> Result<()> {
    if !path.exists() {
        return Err(Error::Environment {
            message: format!("configuration file not found: {}", path.display()),
        });
    }
    info!("patching {}", path.display());

    let mut xot = Xot::new();
    let document = xml::load_document(&mut xot, path)?;
    let server = xot.document_element(document)?;

    let (profile, _) = xml::get_or_create_child(&mut xot, server, &ChildSpec::new("profile"))?;
    let (subsystem, created) = xml::get_or_create_child(
        &mut xot,
        profile,
        &ChildSpec::new("subsystem")
            .namespace(EE_SUBSYSTEM_NAMESPACE)
            .create_namespace(EE_SUBSYSTEM_CREATE_NAMESPACE),
    )?;
    if created {
        debug!("created ee subsystem in {}", path.display());
    }
    let (global_modules, _) =
        xml::get_or_create_child(&mut xot, subsystem, &ChildSpec::new("global-modules"))?;

    if write_mode == WriteMode::Replace {
        // Full resync: drop every existing registration first.
        for child in xml::element_children(&xot, global_modules) {
            xot.remove(child)?;
        }
    }

    for registration in registrations {
        let (entry, created) = xml::get_or_create_child(
            &mut xot,
            global_modules,
            &ChildSpec::new("module")
                .attribute("name", registration.name.clone())
                .attribute("slot", registration.slot.clone()),
        )?;
        if created && !is_global {
            xot.remove(entry)?;
            debug!(
                "rolled back registration of {}:{} (isGlobal=false)",
                registration.name, registration.slot
            );
        } else if created {
            info!(
                "registered global module {}:{}",
                registration.name, registration.slot
            );
        }
    }

    xml::write_document(&mut xot, document, path).map_err(|e| Error::ConfigPatch {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Read the `(name, slot)` pairs currently registered in a configuration's
/// `global-modules` element.
pub fn registered_modules(path: &Path) -> Result<Vec<ModuleRef>> {
    let mut xot = Xot::new();
    let document = xml::load_document(&mut xot, path)?;
    let server = xot.document_element(document)?;

    let mut registrations = Vec::new();
    let Some(profile) = xml::find_child(&xot, server, "profile", None) else {
        return Ok(registrations);
    };
    let Some(subsystem) =
        xml::find_child(&xot, profile, "subsystem", Some(EE_SUBSYSTEM_NAMESPACE))
    else {
        return Ok(registrations);
    };
    let Some(global_modules) = xml::find_child(&xot, subsystem, "global-modules", None) else {
        return Ok(registrations);
    };

    for entry in xml::element_children(&xot, global_modules) {
        if xml::local_name(&xot, entry).as_deref() != Some("module") {
            continue;
        }
        let name = xml::attribute_value(&xot, entry, "name").unwrap_or_default();
        let slot =
            xml::attribute_value(&xot, entry, "slot").unwrap_or_else(|| "main".to_string());
        registrations.push(ModuleRef { name, slot });
    }
    Ok(registrations)
}
