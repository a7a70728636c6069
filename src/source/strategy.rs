//! Build strategies: the ordered command sequence for each build system.
//!
//! A [`BuildPlan`] is computed up front from the detected [`BuildSystem`] and
//! the repository contents (optional steps such as `autoreconf` are decided
//! here), then executed fail-fast.

use std::path::{Path, PathBuf};

use crate::common::command::{CommandRunner, Invocation};
use crate::common::config::ForgedConfig;
use crate::error::ForgeError;
use crate::source::detect::BuildSystem;
use crate::ui::prelude::*;

/// Bundler configs that make a Node project worth `npm run build`.
const NODE_BUNDLER_CONFIGS: &[&str] = &[
    "webpack.config.js",
    "webpack.config.cjs",
    "webpack.config.mjs",
    "webpack.config.ts",
    "vite.config.js",
    "vite.config.mjs",
    "vite.config.ts",
];

/// Everything a strategy needs to lay out its steps.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub dir: PathBuf,
    pub project: String,
    pub install_prefix: String,
    pub go_bin_dir: String,
    pub jobs: usize,
}

impl BuildContext {
    pub fn new(dir: impl Into<PathBuf>, project: impl Into<String>, config: &ForgedConfig) -> Self {
        Self {
            dir: dir.into(),
            project: project.into(),
            install_prefix: config.install_prefix.clone(),
            go_bin_dir: config.go_bin_dir.clone(),
            jobs: available_jobs(),
        }
    }

    fn has(&self, file: &str) -> bool {
        self.dir.join(file).exists()
    }

    fn prefix_arg(&self) -> String {
        format!("--prefix={}", self.install_prefix)
    }

    fn jobs_arg(&self) -> String {
        format!("-j{}", self.jobs)
    }
}

pub fn available_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A named step of a build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub invocation: Invocation,
}

#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub system: BuildSystem,
    pub project: String,
    pub dir: PathBuf,
    pub steps: Vec<Step>,
}

struct PlanBuilder<'a> {
    ctx: &'a BuildContext,
    steps: Vec<Step>,
}

impl<'a> PlanBuilder<'a> {
    fn new(ctx: &'a BuildContext) -> Self {
        Self {
            ctx,
            steps: Vec::new(),
        }
    }

    fn step<I, S>(mut self, name: &str, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(Step {
            name: name.to_string(),
            invocation: Invocation::new(program, args).in_dir(&self.ctx.dir),
        });
        self
    }

    fn privileged_step<I, S>(mut self, name: &str, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(Step {
            name: name.to_string(),
            invocation: Invocation::new(program, args)
                .in_dir(&self.ctx.dir)
                .privileged(),
        });
        self
    }

    fn build(self) -> Vec<Step> {
        self.steps
    }
}

impl BuildSystem {
    /// Lay out the steps for this build system in `ctx.dir`.
    pub fn plan(&self, ctx: &BuildContext) -> BuildPlan {
        let b = PlanBuilder::new(ctx);

        let steps = match self {
            BuildSystem::Pkgbuild => b.step("makepkg", "makepkg", ["-si", "--noconfirm"]).build(),

            BuildSystem::Meson => b
                .step(
                    "meson setup",
                    "meson",
                    ["setup".to_string(), "build".to_string(), ctx.prefix_arg()],
                )
                .step("ninja build", "ninja", ["-C", "build"])
                .privileged_step("ninja install", "ninja", ["-C", "build", "install"])
                .build(),

            BuildSystem::CMake => b
                .step(
                    "cmake",
                    "cmake",
                    [
                        "-B".to_string(),
                        "build".to_string(),
                        format!("-DCMAKE_INSTALL_PREFIX={}", ctx.install_prefix),
                    ],
                )
                .step(
                    "cmake build",
                    "cmake",
                    [
                        "--build".to_string(),
                        "build".to_string(),
                        "--parallel".to_string(),
                        ctx.jobs.to_string(),
                    ],
                )
                .privileged_step("cmake install", "cmake", ["--install", "build"])
                .build(),

            BuildSystem::Node => {
                let b = b.step("npm install", "npm", ["install"]);
                if NODE_BUNDLER_CONFIGS.iter().any(|f| ctx.has(f)) {
                    b.step("npm run build", "npm", ["run", "build"]).build()
                } else {
                    b.build()
                }
            }

            BuildSystem::Maven => b.step("mvn install", "mvn", ["clean", "install"]).build(),

            BuildSystem::Gradle => {
                if ctx.has("gradlew") {
                    b.step("chmod gradlew", "chmod", ["+x", "gradlew"])
                        .step("./gradlew build", "./gradlew", ["build"])
                        .build()
                } else {
                    b.step("gradle build", "gradle", ["build"]).build()
                }
            }

            BuildSystem::Autotools => {
                let b = if ctx.has("configure") {
                    b
                } else {
                    b.step("autoreconf", "autoreconf", ["-fi"])
                };
                b.step("./configure", "./configure", [ctx.prefix_arg()])
                    .step("make", "make", [ctx.jobs_arg()])
                    .privileged_step("make install", "make", ["install"])
                    .build()
            }

            BuildSystem::Go => {
                let target = Path::new(&ctx.go_bin_dir).join(&ctx.project);
                b.step(
                    "go build",
                    "go",
                    [
                        "build".to_string(),
                        "-o".to_string(),
                        ctx.project.clone(),
                        ".".to_string(),
                    ],
                )
                .privileged_step(
                    "go install",
                    "install",
                    [
                        "-Dm755".to_string(),
                        ctx.project.clone(),
                        target.display().to_string(),
                    ],
                )
                .build()
            }
        };

        BuildPlan {
            system: *self,
            project: ctx.project.clone(),
            dir: ctx.dir.clone(),
            steps,
        }
    }
}

impl BuildPlan {
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run the steps in order. The first failing step stops the plan.
    pub fn execute(&self, runner: &dyn CommandRunner) -> Result<(), ForgeError> {
        emit(
            Level::Info,
            "forge.build.start",
            &format!("{} → {}", self.system, self.step_names().join(" → ")),
            None,
        );
        emit(
            Level::Debug,
            "forge.build.dir",
            &format!("Building {} in {}", self.project, self.dir.display()),
            None,
        );

        for step in &self.steps {
            emit(
                Level::Info,
                "forge.build.step",
                &format!("[{}] {}", step.name, step.invocation),
                None,
            );

            runner
                .run(&step.invocation)
                .map_err(|source| ForgeError::Step {
                    project: self.project.clone(),
                    step: step.name.clone(),
                    source,
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::command::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn ctx_with(files: &[&str]) -> (TempDir, BuildContext) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "").unwrap();
        }
        let ctx = BuildContext {
            dir: dir.path().to_path_buf(),
            project: "demo".to_string(),
            install_prefix: "/usr".to_string(),
            go_bin_dir: "/usr/local/bin".to_string(),
            jobs: 8,
        };
        (dir, ctx)
    }

    fn lines(plan: &BuildPlan) -> Vec<String> {
        plan.steps
            .iter()
            .map(|s| s.invocation.command_line())
            .collect()
    }

    #[test]
    fn test_pkgbuild_is_single_step() {
        let (_dir, ctx) = ctx_with(&["PKGBUILD"]);
        let plan = BuildSystem::Pkgbuild.plan(&ctx);
        assert_eq!(plan.step_names(), vec!["makepkg"]);
        assert_eq!(lines(&plan), vec!["makepkg -si --noconfirm"]);
        assert!(!plan.steps[0].invocation.privileged);
    }

    #[test]
    fn test_meson_steps() {
        let (_dir, ctx) = ctx_with(&["meson.build"]);
        let plan = BuildSystem::Meson.plan(&ctx);
        assert_eq!(
            lines(&plan),
            vec![
                "meson setup build --prefix=/usr",
                "ninja -C build",
                "ninja -C build install",
            ]
        );
        assert!(plan.steps[2].invocation.privileged);
    }

    #[test]
    fn test_cmake_steps_use_job_count() {
        let (_dir, ctx) = ctx_with(&["CMakeLists.txt"]);
        let plan = BuildSystem::CMake.plan(&ctx);
        assert_eq!(plan.step_names(), vec!["cmake", "cmake build", "cmake install"]);
        assert_eq!(
            lines(&plan),
            vec![
                "cmake -B build -DCMAKE_INSTALL_PREFIX=/usr",
                "cmake --build build --parallel 8",
                "cmake --install build",
            ]
        );
        assert!(!plan.steps[0].invocation.privileged);
        assert!(plan.steps[2].invocation.privileged);
    }

    #[test]
    fn test_node_build_only_with_bundler() {
        let (_dir, ctx) = ctx_with(&["package.json"]);
        assert_eq!(BuildSystem::Node.plan(&ctx).step_names(), vec!["npm install"]);

        let (_dir, ctx) = ctx_with(&["package.json", "vite.config.ts"]);
        assert_eq!(
            BuildSystem::Node.plan(&ctx).step_names(),
            vec!["npm install", "npm run build"]
        );
    }

    #[test]
    fn test_maven_single_step() {
        let (_dir, ctx) = ctx_with(&["pom.xml"]);
        assert_eq!(lines(&BuildSystem::Maven.plan(&ctx)), vec!["mvn clean install"]);
    }

    #[test]
    fn test_gradle_prefers_wrapper() {
        let (_dir, ctx) = ctx_with(&["build.gradle", "gradlew"]);
        assert_eq!(
            lines(&BuildSystem::Gradle.plan(&ctx)),
            vec!["chmod +x gradlew", "./gradlew build"]
        );

        let (_dir, ctx) = ctx_with(&["build.gradle"]);
        assert_eq!(lines(&BuildSystem::Gradle.plan(&ctx)), vec!["gradle build"]);
    }

    #[test]
    fn test_autotools_regenerates_missing_configure() {
        let (_dir, ctx) = ctx_with(&["Makefile.am"]);
        assert_eq!(
            lines(&BuildSystem::Autotools.plan(&ctx)),
            vec![
                "autoreconf -fi",
                "./configure --prefix=/usr",
                "make -j8",
                "make install",
            ]
        );

        let (_dir, ctx) = ctx_with(&["configure"]);
        assert_eq!(
            BuildSystem::Autotools.plan(&ctx).step_names(),
            vec!["./configure", "make", "make install"]
        );
    }

    #[test]
    fn test_go_installs_built_binary() {
        let (_dir, ctx) = ctx_with(&["go.mod"]);
        let plan = BuildSystem::Go.plan(&ctx);
        assert_eq!(
            lines(&plan),
            vec!["go build -o demo .", "install -Dm755 demo /usr/local/bin/demo"]
        );
        assert!(plan.steps[1].invocation.privileged);
    }

    #[test]
    fn test_steps_run_in_repo_dir() {
        let (dir, ctx) = ctx_with(&["meson.build"]);
        let plan = BuildSystem::Meson.plan(&ctx);
        assert!(
            plan.steps
                .iter()
                .all(|s| s.invocation.dir.as_deref() == Some(dir.path()))
        );
    }

    #[test]
    fn test_execute_runs_all_steps() {
        let (_dir, ctx) = ctx_with(&["CMakeLists.txt"]);
        let plan = BuildSystem::CMake.plan(&ctx);
        let runner = RecordingRunner::new();

        plan.execute(&runner).unwrap();
        assert_eq!(runner.command_lines(), lines(&plan));
    }

    #[test]
    fn test_failed_configure_stops_cmake() {
        let (_dir, ctx) = ctx_with(&["CMakeLists.txt"]);
        let plan = BuildSystem::CMake.plan(&ctx);
        let runner = RecordingRunner::new().fail_on("cmake -B");

        let err = plan.execute(&runner).unwrap_err();
        assert_eq!(err.step(), Some("cmake"));
        assert_eq!(runner.calls().len(), 1);
        assert!(!runner.ran("cmake --build"));
        assert!(!runner.ran("cmake --install"));
    }

    #[test]
    fn test_failure_at_each_step_stops_the_rest() {
        // Marker sets that produce the longest plan for each system.
        let repos: &[(BuildSystem, &[&str])] = &[
            (BuildSystem::Pkgbuild, &["PKGBUILD"]),
            (BuildSystem::Meson, &["meson.build"]),
            (BuildSystem::CMake, &["CMakeLists.txt"]),
            (BuildSystem::Node, &["package.json", "vite.config.ts"]),
            (BuildSystem::Maven, &["pom.xml"]),
            (BuildSystem::Gradle, &["build.gradle", "gradlew"]),
            (BuildSystem::Autotools, &["Makefile.am"]),
            (BuildSystem::Go, &["go.mod"]),
        ];

        for (system, files) in repos {
            let (_dir, ctx) = ctx_with(files);
            let plan = system.plan(&ctx);
            let all = lines(&plan);

            for (k, step) in plan.steps.iter().enumerate() {
                let runner = RecordingRunner::new().fail_on(&all[k]);
                let err = plan.execute(&runner).unwrap_err();

                assert_eq!(err.step(), Some(step.name.as_str()), "{system} step {k}");
                assert_eq!(runner.command_lines(), all[..=k].to_vec(), "{system} step {k}");
            }
        }
    }
}
