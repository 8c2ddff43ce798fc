//! Git test helper utilities
//!
//! Builds throwaway module repositories for tests that exercise real clones.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git command wrapper for test fixtures.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init"], "Failed to initialize git repository")?;
        Ok(())
    }

    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@tfvercheck.example"],
            "Failed to configure git user email",
        )?;
        self.run_git_command(&["config", "user.name", "Test User"], "Failed to configure git user name")?;
        Ok(())
    }

    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "."], "Failed to add files to git")?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(&["commit", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run_git_command(&["tag", tag_name], &format!("Failed to create tag: {tag_name}"))?;
        Ok(())
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Create a repository where each `(tag, main_tf)` pair is one tagged commit.
    pub fn module_repo(path: impl Into<PathBuf>, releases: &[(&str, &str)]) -> Result<Self> {
        let git = Self::new(path);
        fs::create_dir_all(&git.repo_path)?;
        git.init()?;
        git.config_user()?;
        for (tag, main_tf) in releases {
            fs::write(git.repo_path.join("main.tf"), main_tf)?;
            git.add_all()?;
            git.commit(&format!("Release {tag}"))?;
            git.tag(tag)?;
        }
        Ok(git)
    }
}
