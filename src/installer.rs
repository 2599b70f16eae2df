//! # Install Orchestration
//!
//! The library entry point tying the pipeline together:
//!
//! 1. **Environment check**: the server install root and every target
//!    configuration file must exist before anything is mutated.
//! 2. **Group reset**: under `REPLACE` the whole group subtree is cleared
//!    once, ahead of the walk.
//! 3. **Tree build**: the module tree builder materializes every module
//!    depth-first.
//! 4. **Configuration patch**: the root module is registered in each target
//!    configuration file.
//!
//! The run result is returned as an [`InstallReport`]; errors abort the run
//! at the failing step with everything already written left in place.

use crate::config::{InstallConfig, WriteMode};
use crate::error::{Error, Result};
use crate::graph::{ArtifactResolver, DependencyNode};
use crate::module::{self, ModuleTreeBuilder};
use crate::patcher;
use crate::report::InstallReport;
use log::info;

/// Verify the target environment without mutating anything.
pub fn check_environment(config: &InstallConfig) -> Result<()> {
    let home = &config.wildfly_home;
    if !home.exists() {
        return Err(Error::Environment {
            message: format!("WildFly home does not exist: {}", home.display()),
        });
    }
    if !home.is_dir() {
        return Err(Error::Environment {
            message: format!("WildFly home is not a directory: {}", home.display()),
        });
    }
    for path in config.config_file_paths() {
        if !path.is_file() {
            return Err(Error::Environment {
                message: format!("configuration file not found: {}", path.display()),
            });
        }
    }
    Ok(())
}

/// Run a full install: materialize the module tree and register the root
/// module in every configured server configuration file.
pub fn install(
    config: &InstallConfig,
    root: &DependencyNode,
    resolver: &dyn ArtifactResolver,
    dry_run: bool,
) -> Result<InstallReport> {
    check_environment(config)?;

    if config.write_mode == WriteMode::Replace && !dry_run {
        let group_home = config.group_home();
        if group_home.is_dir() {
            info!("clearing group subtree {}", group_home.display());
            module::clear_directory(&group_home)?;
        }
    }

    let mut builder = ModuleTreeBuilder::new(config, resolver, dry_run);
    let root_ref = builder.build_tree(root)?;
    let mut report = builder.into_report();

    if dry_run {
        info!("dry run, skipping configuration patch");
        return Ok(report);
    }

    for path in config.config_file_paths() {
        patcher::patch(
            &path,
            std::slice::from_ref(&root_ref),
            config.write_mode,
            config.is_global,
        )?;
        report.record_write(path);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::graph::{self, FileResolver};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const STANDALONE: &str = r#"<server xmlns="urn:jboss:domain:17.0">
    <profile>
        <subsystem xmlns="urn:jboss:domain:ee:5.0"/>
    </profile>
</server>"#;

    struct Fixture {
        _temp: TempDir,
        wildfly_home: PathBuf,
        repo: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let wildfly_home = temp.path().join("wildfly");
            fs::create_dir_all(wildfly_home.join("modules")).unwrap();
            let configuration = wildfly_home.join("standalone").join("configuration");
            fs::create_dir_all(&configuration).unwrap();
            fs::write(configuration.join("standalone.xml"), STANDALONE).unwrap();
            let repo = temp.path().join("repo");
            fs::create_dir_all(&repo).unwrap();
            Self {
                _temp: temp,
                wildfly_home,
                repo,
            }
        }

        fn config(&self, extra_yaml: &str) -> InstallConfig {
            config::parse(&format!(
                "wildflyHome: {}\n{}",
                self.wildfly_home.display(),
                extra_yaml
            ))
            .unwrap()
        }

        fn single_node_graph(&self) -> DependencyNode {
            let jar = self.repo.join("driver-1.0.jar");
            fs::write(&jar, b"jar").unwrap();
            graph::parse(&format!(
                "groupId: com.acme\nartifactId: driver\nversion: \"1.0\"\nfile: {}",
                jar.display()
            ))
            .unwrap()
        }

        fn standalone_path(&self) -> PathBuf {
            self.wildfly_home
                .join("standalone/configuration/standalone.xml")
        }
    }

    #[test]
    fn test_install_registers_root_module() {
        let fixture = Fixture::new();
        let config = fixture.config("");
        let root = fixture.single_node_graph();

        let report = install(&config, &root, &FileResolver, false).unwrap();
        assert_eq!(report.modules.len(), 1);

        let registrations = patcher::registered_modules(&fixture.standalone_path()).unwrap();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].name, "global.com.acme.driver");
        assert_eq!(registrations[0].slot, "1.0");
    }

    #[test]
    fn test_missing_wildfly_home_fails_fast() {
        let fixture = Fixture::new();
        let mut config = fixture.config("");
        config.wildfly_home = PathBuf::from("/nonexistent/wildfly");
        let root = fixture.single_node_graph();

        let err = install(&config, &root, &FileResolver, false).unwrap_err();
        assert!(format!("{}", err).contains("WildFly home does not exist"));
    }

    #[test]
    fn test_wildfly_home_not_a_directory() {
        let fixture = Fixture::new();
        let file = fixture.wildfly_home.join("not-a-dir");
        fs::write(&file, b"x").unwrap();
        let mut config = fixture.config("");
        config.wildfly_home = file;

        let err = check_environment(&config).unwrap_err();
        assert!(format!("{}", err).contains("not a directory"));
    }

    #[test]
    fn test_missing_config_file_fails_before_mutation() {
        let fixture = Fixture::new();
        let config = fixture.config("configFiles: [standalone-full.xml]");
        let root = fixture.single_node_graph();

        let err = install(&config, &root, &FileResolver, false).unwrap_err();
        assert!(format!("{}", err).contains("configuration file not found"));
        // Nothing was written.
        assert!(!fixture.wildfly_home.join("modules/global").exists());
    }

    #[test]
    fn test_replace_clears_group_subtree_first() {
        let fixture = Fixture::new();
        let config = fixture.config("writeMode: REPLACE");
        let root = fixture.single_node_graph();

        let leftover = fixture
            .wildfly_home
            .join("modules/global/com/acme/legacy/0.9");
        fs::create_dir_all(&leftover).unwrap();
        fs::write(leftover.join("legacy-0.9.jar"), b"old").unwrap();

        install(&config, &root, &FileResolver, false).unwrap();

        assert!(!leftover.exists());
        assert!(fixture
            .wildfly_home
            .join("modules/global/com/acme/driver/1.0/module.xml")
            .is_file());
    }

    #[test]
    fn test_dry_run_skips_patch_and_writes() {
        let fixture = Fixture::new();
        let config = fixture.config("");
        let root = fixture.single_node_graph();
        let before = fs::read_to_string(fixture.standalone_path()).unwrap();

        let report = install(&config, &root, &FileResolver, true).unwrap();
        assert!(report.dry_run);
        assert!(report.written.is_empty());
        assert_eq!(
            fs::read_to_string(fixture.standalone_path()).unwrap(),
            before
        );
    }

    #[test]
    fn test_not_global_keeps_configuration_registration_free() {
        let fixture = Fixture::new();
        let config = fixture.config("isGlobal: false");
        let root = fixture.single_node_graph();

        install(&config, &root, &FileResolver, false).unwrap();
        assert!(patcher::registered_modules(&fixture.standalone_path())
            .unwrap()
            .is_empty());
    }
}
