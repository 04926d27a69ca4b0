// crates/suitebase-core/src/builtins.rs
// ============================================================================
// Module: Built-in Extension Classes
// Description: Base runnable, test, and resource classes plus sample classes.
// Purpose: Seed registries with the classes every store relies on.
// Dependencies: suitebase-core
// ============================================================================

//! ## Overview
//! Every test class ultimately extends [`TEST_CLASS`] and every resource
//! class extends [`RESOURCE_CLASS`]; both extend the abstract
//! [`RUNNABLE_CLASS`], which declares the resource dependencies and the
//! computed item id. Stores interpret the well-known field names exported
//! here when computing prerequisites, resource lists, and federated ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::extension::ExtensionClass;
use crate::extension::ExtensionKind;
use crate::extension::ExtensionRegistry;
use crate::extension::SchemaError;
use crate::field::Field;
use crate::field::ReferenceKind;
use crate::value::FieldValue;

// ============================================================================
// SECTION: Well-known Names
// ============================================================================

/// Abstract base of tests and resources.
pub const RUNNABLE_CLASS: &str = "runnable.Runnable";
/// Abstract base of all test classes.
pub const TEST_CLASS: &str = "test.Test";
/// Abstract base of all resource classes.
pub const RESOURCE_CLASS: &str = "resource.Resource";
/// Runs a program and checks its output.
pub const EXEC_TEST_CLASS: &str = "command.ExecTest";
/// Runs a shell command and checks its output.
pub const SHELL_COMMAND_TEST_CLASS: &str = "command.ShellCommandTest";
/// Provides a scratch directory to dependent tests.
pub const TEMP_DIRECTORY_RESOURCE_CLASS: &str = "temporary.TempDirectoryResource";

/// Field listing the resources a runnable requires.
pub const RESOURCES_FIELD: &str = "resources";
/// Computed field holding the id of the stored item.
pub const ITEM_ID_FIELD: &str = "item_id";
/// Field listing `(test id, outcome)` prerequisite pairs.
pub const PREREQUISITES_FIELD: &str = "prerequisites";
/// Field naming the target group a test runs on.
pub const TARGET_GROUP_FIELD: &str = "target_group";

/// Test passed.
pub const OUTCOME_PASS: &str = "PASS";
/// Test failed.
pub const OUTCOME_FAIL: &str = "FAIL";
/// Test could not be run to completion.
pub const OUTCOME_ERROR: &str = "ERROR";
/// Test was not run.
pub const OUTCOME_UNTESTED: &str = "UNTESTED";

/// All outcomes in canonical order.
pub const OUTCOMES: [&str; 4] = [OUTCOME_PASS, OUTCOME_FAIL, OUTCOME_ERROR, OUTCOME_UNTESTED];

// ============================================================================
// SECTION: Field Builders
// ============================================================================

/// Fields shared by tests and resources.
fn runnable_fields() -> Vec<Field> {
    vec![
        Field::set(RESOURCES_FIELD, Field::reference("resource", ReferenceKind::Resource))
            .with_title("Resources")
            .with_description("Resources that must be set up before this item runs."),
        Field::text(ITEM_ID_FIELD)
            .with_title("Item Id")
            .with_description("Id under which the item is stored.")
            .computed(),
    ]
}

/// Fields shared by every test class.
fn test_fields() -> Vec<Field> {
    vec![
        Field::set(
            PREREQUISITES_FIELD,
            Field::tuple(
                "prerequisite",
                vec![
                    Field::reference("test_id", ReferenceKind::Test),
                    Field::enumeration("outcome", OUTCOMES),
                ],
            ),
        )
        .with_title("Prerequisite Tests")
        .with_description("Tests that must produce the given outcome before this test runs."),
        Field::text(TARGET_GROUP_FIELD)
            .with_title("Target Group")
            .with_description("Pattern selecting the targets this test may run on.")
            .with_default(FieldValue::text(".*")),
    ]
}

/// Input and expectation fields shared by command tests.
fn command_io_fields() -> Vec<Field> {
    vec![
        Field::multiline_text("stdin")
            .with_title("Standard Input")
            .with_description("Contents of the standard input stream."),
        Field::set("environment", Field::text("variable"))
            .with_title("Environment")
            .with_description("Additional `VAR=VAL` environment entries."),
        Field::integer("exit_code")
            .with_title("Exit Code")
            .with_description("Expected exit code."),
        Field::multiline_text("stdout")
            .with_title("Standard Output")
            .with_description("Expected contents of the standard output stream."),
        Field::multiline_text("stderr")
            .with_title("Standard Error")
            .with_description("Expected contents of the standard error stream."),
    ]
}

/// Fields of the program-running test.
fn exec_test_fields() -> Vec<Field> {
    let mut fields = vec![
        Field::text("program")
            .with_title("Program")
            .with_description("Path to the program; searched on `PATH` when relative."),
        Field::set("arguments", Field::text("argument"))
            .with_title("Argument List")
            .with_description("Command-line arguments passed after the program path."),
    ];
    fields.extend(command_io_fields());
    fields
}

/// Fields of the shell-command test.
fn shell_command_test_fields() -> Vec<Field> {
    let mut fields = vec![
        Field::text("command")
            .with_title("Command")
            .with_description("Command line handed to the shell."),
    ];
    fields.extend(command_io_fields());
    fields
}

/// Fields of the temporary directory resource.
fn temp_directory_fields() -> Vec<Field> {
    vec![
        Field::text("dir_path_property")
            .with_title("Directory Path Property")
            .with_description("Context property receiving the directory path.")
            .with_default(FieldValue::text("temp_dir_path")),
        Field::boolean("delete_recursively")
            .with_title("Delete Recursively")
            .with_description("Whether the directory is removed with its contents."),
    ]
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Returns the built-in class declarations in registration order.
#[must_use]
pub fn builtin_classes() -> Vec<ExtensionClass> {
    vec![
        ExtensionClass::new(RUNNABLE_CLASS, ExtensionKind::Test)
            .with_description("Common base of tests and resources.")
            .with_fields(runnable_fields)
            .with_reserved_names(["id", "database"])
            .abstract_class(),
        ExtensionClass::new(TEST_CLASS, ExtensionKind::Test)
            .with_description("Base class of all tests.")
            .extends(RUNNABLE_CLASS)
            .with_fields(test_fields)
            .with_reserved_names(["run"])
            .abstract_class(),
        ExtensionClass::new(RESOURCE_CLASS, ExtensionKind::Resource)
            .with_description("Base class of all resources.")
            .extends(RUNNABLE_CLASS)
            .with_reserved_names(["set_up", "clean_up"])
            .abstract_class(),
        ExtensionClass::new(EXEC_TEST_CLASS, ExtensionKind::Test)
            .with_description("Runs a program and compares its output and exit code.")
            .extends(TEST_CLASS)
            .with_fields(exec_test_fields),
        ExtensionClass::new(SHELL_COMMAND_TEST_CLASS, ExtensionKind::Test)
            .with_description("Runs a shell command and compares its output and exit code.")
            .extends(TEST_CLASS)
            .with_fields(shell_command_test_fields),
        ExtensionClass::new(TEMP_DIRECTORY_RESOURCE_CLASS, ExtensionKind::Resource)
            .with_description("Creates a temporary directory for dependent tests.")
            .extends(RESOURCE_CLASS)
            .with_fields(temp_directory_fields),
    ]
}

impl ExtensionRegistry {
    /// Creates a registry with the built-in classes registered.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateClass`] only if the built-in list
    /// itself repeats a name.
    pub fn with_builtins() -> Result<Self, SchemaError> {
        let registry = Self::new();
        registry.register_builtins()?;
        Ok(registry)
    }

    /// Registers the built-in classes.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateClass`] when a built-in name is
    /// already registered.
    pub fn register_builtins(&self) -> Result<(), SchemaError> {
        for class in builtin_classes() {
            self.register(class)?;
        }
        Ok(())
    }
}
