//! Build system detection by marker files.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildSystem {
    /// Arch `PKGBUILD`, built and installed with makepkg
    Pkgbuild,
    Meson,
    CMake,
    Node,
    Maven,
    Gradle,
    Autotools,
    Go,
}

/// Marker files per build system, checked top to bottom.
///
/// Order is the tie-break when a repository carries several markers: the
/// first row with any marker present wins and later rows are not consulted.
pub const MARKERS: &[(BuildSystem, &[&str])] = &[
    (BuildSystem::Pkgbuild, &["PKGBUILD"]),
    (BuildSystem::Meson, &["meson.build"]),
    (BuildSystem::CMake, &["CMakeLists.txt"]),
    (BuildSystem::Node, &["package.json"]),
    (BuildSystem::Maven, &["pom.xml"]),
    (
        BuildSystem::Gradle,
        &["build.gradle", "build.gradle.kts", "gradlew"],
    ),
    (BuildSystem::Autotools, &["configure", "Makefile.am"]),
    (BuildSystem::Go, &["go.mod"]),
];

/// Pick the build system for `dir`, or `None` when no marker is present.
pub fn detect(dir: &Path) -> Option<BuildSystem> {
    MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| dir.join(m).exists()))
        .map(|(system, _)| *system)
}

impl BuildSystem {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pkgbuild => "PKGBUILD",
            Self::Meson => "Meson",
            Self::CMake => "CMake",
            Self::Node => "Node.js",
            Self::Maven => "Maven",
            Self::Gradle => "Gradle",
            Self::Autotools => "Autotools",
            Self::Go => "Go",
        }
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_with(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "").unwrap();
        }
        dir
    }

    #[test]
    fn test_each_marker_selects_its_system() {
        for (system, markers) in MARKERS {
            for marker in *markers {
                let dir = repo_with(&[*marker]);
                assert_eq!(detect(dir.path()), Some(*system), "marker {marker}");
            }
        }
    }

    #[test]
    fn test_cmake_wins_over_node() {
        let dir = repo_with(&["package.json", "CMakeLists.txt"]);
        assert_eq!(detect(dir.path()), Some(BuildSystem::CMake));
    }

    #[test]
    fn test_pkgbuild_wins_over_everything() {
        let all: Vec<&str> = MARKERS.iter().flat_map(|(_, m)| m.iter().copied()).collect();
        let dir = repo_with(&all);
        assert_eq!(detect(dir.path()), Some(BuildSystem::Pkgbuild));
    }

    #[test]
    fn test_earliest_row_wins_for_every_pair() {
        for (i, (first, first_markers)) in MARKERS.iter().enumerate() {
            for (_, later_markers) in &MARKERS[i + 1..] {
                let dir = repo_with(&[first_markers[0], later_markers[0]]);
                assert_eq!(detect(dir.path()), Some(*first));
                // Repeatable
                assert_eq!(detect(dir.path()), Some(*first));
            }
        }
    }

    #[test]
    fn test_gradle_wrapper_alone() {
        let dir = repo_with(&["gradlew", "go.mod"]);
        assert_eq!(detect(dir.path()), Some(BuildSystem::Gradle));
    }

    #[test]
    fn test_no_marker() {
        let dir = repo_with(&["README.md", "Makefile"]);
        assert_eq!(detect(dir.path()), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(BuildSystem::CMake.to_string(), "CMake");
        assert_eq!(BuildSystem::Node.to_string(), "Node.js");
    }
}
