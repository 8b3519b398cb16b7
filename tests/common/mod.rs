// Test utility module for splitmap integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CSHARP_PROJECT_TYPE: &str = "FAE04EC0-301F-11D3-BF4B-00C04F79EFBC";
const VB_PROJECT_TYPE: &str = "F184B08F-C81C-45F6-A57F-5ABD9991F28F";
const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// A solution laid out on disk: one directory per project under a temp root.
pub struct SolutionFixture {
    pub dir: TempDir,
    entries: Vec<(String, String, String)>,
}

impl SolutionFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            entries: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<name>/<name>.csproj` (or `.vbproj`) and list it in the solution.
    pub fn project(mut self, name: &str, extension: &str, manifest: &str) -> Self {
        let project_dir = self.root().join(name);
        fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        fs::write(project_dir.join(format!("{name}.{extension}")), manifest)
            .expect("Failed to write manifest");

        let type_guid = if extension == "vbproj" {
            VB_PROJECT_TYPE
        } else {
            CSHARP_PROJECT_TYPE
        };
        self.entries.push((
            type_guid.to_string(),
            name.to_string(),
            format!("{name}\\{name}.{extension}"),
        ));
        self
    }

    /// List a project whose manifest is never written.
    pub fn missing_project(mut self, name: &str) -> Self {
        self.entries.push((
            CSHARP_PROJECT_TYPE.to_string(),
            name.to_string(),
            format!("{name}\\{name}.csproj"),
        ));
        self
    }

    pub fn folder(mut self, name: &str) -> Self {
        self.entries.push((
            SOLUTION_FOLDER_TYPE.to_string(),
            name.to_string(),
            name.to_string(),
        ));
        self
    }

    pub fn source(self, project: &str, file: &str, content: &str) -> Self {
        let path = self.root().join(project).join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create source dir");
        }
        fs::write(path, content).expect("Failed to write source file");
        self
    }

    /// Write `<name>.sln` and return its path.
    pub fn write_solution(&self, name: &str) -> PathBuf {
        let mut sln = String::from(
            "\nMicrosoft Visual Studio Solution File, Format Version 12.00\n# Visual Studio Version 17\n",
        );
        for (i, (type_guid, project, path)) in self.entries.iter().enumerate() {
            sln.push_str(&format!(
                "Project(\"{{{type_guid}}}\") = \"{project}\", \"{path}\", \"{{00000000-0000-0000-0000-{i:012}}}\"\nEndProject\n"
            ));
        }
        sln.push_str("Global\nEndGlobal\n");

        let path = self.root().join(format!("{name}.sln"));
        fs::write(&path, sln).expect("Failed to write solution");
        path
    }
}

/// Modern SDK-style manifest.
pub fn sdk_manifest(framework: &str, project_refs: &[&str], packages: &[&str]) -> String {
    let mut items = String::new();
    for project in project_refs {
        items.push_str(&format!(
            "    <ProjectReference Include=\"..\\{project}\\{project}.csproj\" />\n"
        ));
    }
    for package in packages {
        items.push_str(&format!(
            "    <PackageReference Include=\"{package}\" Version=\"1.0.0\" />\n"
        ));
    }
    format!(
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <TargetFramework>{framework}</TargetFramework>\n  </PropertyGroup>\n  <ItemGroup>\n{items}  </ItemGroup>\n</Project>\n"
    )
}
