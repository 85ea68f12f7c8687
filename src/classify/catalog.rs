//! Static knowledge base for well-known tool error codes.
//!
//! An explicit, exhaustively enumerable catalogue (code → category, hint,
//! explanation, docs, fixes) rather than anything reflective: lookups are
//! exact-match on the uppercased code string, so `NU1101X` never matches
//! `NU1101`. Codes absent from the catalogue fall back to
//! [`ErrorCategory::Unknown`] with a generic hint — the catalogue is a
//! quality-of-life layer, not a gate.
//!
//! The entry set is representative, not exhaustive; integrators carrying
//! their own diagnostics extend it here.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::result::ErrorCategory;

/// Catalogue entry for one known error code.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub category: ErrorCategory,
    pub hint: &'static str,
    pub explanation: Option<&'static str>,
    pub documentation_url: Option<&'static str>,
    pub suggested_fixes: &'static [&'static str],
}

macro_rules! entry {
    ($code:literal, $category:ident, $hint:literal, $explanation:expr, $url:expr, $fixes:expr) => {
        (
            $code,
            CodeInfo {
                category: ErrorCategory::$category,
                hint: $hint,
                explanation: $explanation,
                documentation_url: $url,
                suggested_fixes: $fixes,
            },
        )
    };
}

static CATALOG: LazyLock<HashMap<&'static str, CodeInfo>> = LazyLock::new(|| {
    HashMap::from([
        // ---- Compiler (CS) ----
        entry!(
            "CS0103",
            Compilation,
            "The name does not exist in the current context — check spelling and using directives.",
            Some("The compiler could not resolve an identifier to any symbol in scope."),
            Some("https://learn.microsoft.com/dotnet/csharp/misc/cs0103"),
            &[
                "Check the identifier for typos",
                "Add the missing using directive or assembly reference",
            ]
        ),
        entry!(
            "CS0246",
            Compilation,
            "A type or namespace could not be found — a using directive or package reference is missing.",
            Some("The compiler could not find the named type or namespace in any referenced assembly."),
            Some("https://learn.microsoft.com/dotnet/csharp/misc/cs0246"),
            &[
                "Add the missing using directive",
                "Add the package that provides the type",
            ]
        ),
        entry!(
            "CS1002",
            Compilation,
            "A ';' is expected — the previous statement is unterminated.",
            None,
            Some("https://learn.microsoft.com/dotnet/csharp/misc/cs1002"),
            &["Terminate the statement with a semicolon"]
        ),
        entry!(
            "CS0029",
            Compilation,
            "The value cannot be implicitly converted to the target type.",
            Some("An implicit conversion between the two types does not exist."),
            Some("https://learn.microsoft.com/dotnet/csharp/misc/cs0029"),
            &["Add an explicit cast or change the declared type"]
        ),
        entry!(
            "CS1061",
            Compilation,
            "The member does not exist on the receiver type — check the member name and extension method imports.",
            None,
            Some("https://learn.microsoft.com/dotnet/csharp/misc/cs1061"),
            &["Check the member name", "Import the namespace that defines the extension method"]
        ),
        entry!(
            "CS5001",
            Compilation,
            "The program has no entry point — a static Main method (or top-level statements) is required.",
            None,
            Some("https://learn.microsoft.com/dotnet/csharp/misc/cs5001"),
            &["Add a static Main method or top-level statements"]
        ),
        // ---- Package manager (NU) ----
        entry!(
            "NU1101",
            Package,
            "The package does not exist in any configured source.",
            Some("No package with this ID was found in the feeds listed in NuGet.config."),
            Some("https://learn.microsoft.com/nuget/reference/errors-and-warnings/nu1101"),
            &[
                "Check the package ID for typos",
                "Add the feed that hosts the package to NuGet.config",
            ]
        ),
        entry!(
            "NU1102",
            Package,
            "The package exists but not in the requested version.",
            Some("A package with this ID was found, but no version satisfied the requested range."),
            Some("https://learn.microsoft.com/nuget/reference/errors-and-warnings/nu1102"),
            &["Relax the version range", "Check which versions the feed actually hosts"]
        ),
        entry!(
            "NU1103",
            Package,
            "No stable version of the package satisfies the range — only prereleases exist.",
            None,
            Some("https://learn.microsoft.com/nuget/reference/errors-and-warnings/nu1103"),
            &["Allow prerelease versions or pin a prerelease version explicitly"]
        ),
        entry!(
            "NU1201",
            Package,
            "The referenced project targets a framework incompatible with this project.",
            None,
            Some("https://learn.microsoft.com/nuget/reference/errors-and-warnings/nu1201"),
            &["Align the target frameworks of the two projects"]
        ),
        entry!(
            "NU1605",
            Package,
            "A package downgrade was detected in the dependency graph.",
            Some("A transitive dependency requires a higher version than the direct reference pins."),
            Some("https://learn.microsoft.com/nuget/reference/errors-and-warnings/nu1605"),
            &["Reference the higher version directly"]
        ),
        // ---- Build engine (MSB) ----
        entry!(
            "MSB1003",
            Build,
            "No project or solution file was specified and none was found in the working directory.",
            None,
            None,
            &["Pass the project or solution path explicitly"]
        ),
        entry!(
            "MSB1009",
            Build,
            "The project file does not exist.",
            None,
            None,
            &["Check the project path for typos"]
        ),
        entry!(
            "MSB3644",
            Build,
            "Reference assemblies for the target framework are not installed.",
            Some("The targeting pack for the requested framework version is missing on this machine."),
            Some("https://learn.microsoft.com/visualstudio/msbuild/errors/msb3644"),
            &["Install the targeting pack", "Retarget the project to an installed framework"]
        ),
        entry!(
            "MSB4018",
            Build,
            "A build task failed unexpectedly — this is an internal build-engine failure.",
            None,
            Some("https://learn.microsoft.com/visualstudio/msbuild/errors/msb4018"),
            &[]
        ),
        // ---- SDK (NETSDK) ----
        entry!(
            "NETSDK1004",
            Sdk,
            "The assets file is missing — run a restore first.",
            Some("project.assets.json was not found; the project has not been restored."),
            Some("https://learn.microsoft.com/dotnet/core/tools/sdk-errors/netsdk1004"),
            &["Run restore before building"]
        ),
        entry!(
            "NETSDK1013",
            Sdk,
            "The TargetFramework value was not recognized.",
            None,
            Some("https://learn.microsoft.com/dotnet/core/tools/sdk-errors/"),
            &["Check the TargetFramework moniker for typos"]
        ),
        entry!(
            "NETSDK1045",
            Sdk,
            "The installed SDK does not support the requested target framework.",
            Some("The project targets a framework newer than any installed SDK supports."),
            Some("https://learn.microsoft.com/dotnet/core/tools/sdk-errors/netsdk1045"),
            &["Install a newer SDK", "Lower the project's target framework"]
        ),
        // ---- Crate-internal codes ----
        entry!(
            "CONCURRENCY_CONFLICT",
            Concurrency,
            "A conflicting operation is already running against this target — retry once it completes.",
            Some("Mutating operations on the same project are mutually exclusive."),
            None,
            &["Wait for the running operation to finish and retry"]
        ),
        entry!(
            "OPERATION_CANCELLED",
            Cancelled,
            "The operation was cancelled before completion.",
            None,
            None,
            &[]
        ),
    ])
});

/// Exact-match catalogue lookup, case-insensitive on the code string.
///
/// `"nu1101"` matches; `"NU1101X"` does not.
pub fn lookup(code: &str) -> Option<&'static CodeInfo> {
    CATALOG.get(code.to_ascii_uppercase().as_str())
}
