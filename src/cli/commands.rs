use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sm", about = concat!("sitemon v", env!("CARGO_PKG_VERSION"), " - construction project monitoring"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace in the current directory
    Init(InitArgs),
    /// List all projects
    Projects,
    /// Project management
    Project(ProjectCmd),
    /// List stages of a project
    Stages(ProjectScope),
    /// Stage management
    Stage(StageCmd),
    /// List objects of a project, narrowed by the current filter
    Objects(ObjectsArgs),
    /// Object management
    Object(ObjectCmd),
    /// Manage the selection set
    Select(SelectCmd),
    /// Apply a change to every selected object
    Bulk(BulkCmd),
    /// Export objects to an XLSX workbook
    Export(ExportArgs),
    /// Merge an XLSX workbook into a project
    Import(ImportArgs),
    /// Work status labels and colors
    Status(StatusCmd),
    /// Show portfolio statistics
    Stats,
    /// Validate portfolio integrity
    Check,
    /// List the violation catalog
    Violations,
    /// Sign in (two steps: request a code, then pass it with --code)
    Login(LoginArgs),
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// User administration (admin only)
    Users(UsersCmd),
    /// Send a message through the contact form
    Contact(ContactArgs),
    /// Object table columns: visibility, order and groups
    Columns(ColumnsCmd),
    /// Show or edit config.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Workspace name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Seed the workspace with sample projects
    #[arg(long)]
    pub demo: bool,
    /// Reinitialize even if sitemon/ already exists
    #[arg(long)]
    pub force: bool,
}

/// Target project; defaults to the one opened with `sm project open`
#[derive(Args)]
pub struct ProjectScope {
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project
    Add(ProjectAddArgs),
    /// Edit project fields
    Edit(ProjectEditArgs),
    /// Delete a project with its stages and objects
    Rm(IdArg),
    /// Show project details
    Show(OptionalIdArg),
    /// Make a project the default for later commands
    Open(IdArg),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    pub name: String,
    /// road, bridge or utility
    #[arg(long = "type")]
    pub kind: String,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: String,
    #[arg(long, default_value_t = 0.0)]
    pub budget: f64,
    #[arg(long, default_value_t = 0.0)]
    pub spent: f64,
    /// Percentage, 0-100
    #[arg(long, default_value_t = 0)]
    pub progress: u8,
    /// on-track, at-risk or delayed
    #[arg(long, default_value = "on-track")]
    pub status: String,
}

#[derive(Args)]
pub struct ProjectEditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub budget: Option<f64>,
    #[arg(long)]
    pub spent: Option<f64>,
    #[arg(long)]
    pub progress: Option<u8>,
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args)]
pub struct OptionalIdArg {
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StageCmd {
    #[command(subcommand)]
    pub action: StageAction,
}

#[derive(Subcommand)]
pub enum StageAction {
    /// Add a stage to a project
    Add(StageAddArgs),
    /// Edit stage fields
    Edit(StageEditArgs),
    /// Delete a stage (objects are removed or detached per stages.on_delete)
    Rm(StageRmArgs),
}

#[derive(Args)]
pub struct StageAddArgs {
    pub name: String,
    #[arg(long)]
    pub start: String,
    #[arg(long)]
    pub end: String,
    #[arg(long, default_value_t = 0)]
    pub progress: u8,
    /// completed, in-progress or pending
    #[arg(long, default_value = "pending")]
    pub status: String,
    #[command(flatten)]
    pub scope: ProjectScope,
}

#[derive(Args)]
pub struct StageEditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub progress: Option<u8>,
    #[arg(long)]
    pub status: Option<String>,
    #[command(flatten)]
    pub scope: ProjectScope,
}

#[derive(Args)]
pub struct StageRmArgs {
    pub id: String,
    /// Override stages.on_delete for this deletion (cascade or detach)
    #[arg(long)]
    pub policy: Option<String>,
    #[command(flatten)]
    pub scope: ProjectScope,
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ObjectsArgs {
    /// all, no-stage, or a stage id
    #[arg(long)]
    pub stage: Option<String>,
    /// all, none, or 1-5
    #[arg(long)]
    pub delivery: Option<String>,
    /// all, completed, in-progress, not-started, with-permits or no-permits
    #[arg(long)]
    pub status: Option<String>,
    /// Clear the saved filter before applying the flags above
    #[arg(long)]
    pub reset: bool,
    #[command(flatten)]
    pub scope: ProjectScope,
}

#[derive(Args)]
pub struct ObjectCmd {
    #[command(subcommand)]
    pub action: ObjectAction,
}

#[derive(Subcommand)]
pub enum ObjectAction {
    /// Add an object to a project
    Add(ObjectAddArgs),
    /// Edit object fields
    Edit(ObjectEditArgs),
    /// Delete an object
    Rm(IdArg),
    /// Show object details
    Show(IdArg),
    /// Record or remove violation codes
    Violation(ViolationCmd),
}

/// Editable object fields. Unset flags leave the field unchanged.
#[derive(Args, Default)]
pub struct ObjectFields {
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub coordinates: Option<String>,
    #[arg(long)]
    pub inspection: Option<bool>,
    #[arg(long)]
    pub pole_permit: Option<bool>,
    #[arg(long)]
    pub power_permit: Option<bool>,
    #[arg(long)]
    pub other_permits: Option<String>,
    #[arg(long)]
    pub equipment: Option<String>,
    #[arg(long)]
    pub quantity: Option<u32>,
    #[arg(long)]
    pub verification_certificate: Option<bool>,
    #[arg(long)]
    pub executive_docs: Option<bool>,
    #[arg(long)]
    pub construction: Option<bool>,
    #[arg(long)]
    pub commissioning: Option<bool>,
    #[arg(long)]
    pub traffic: Option<bool>,
    #[arg(long)]
    pub web_upload: Option<bool>,
    #[arg(long)]
    pub violation_recording: Option<bool>,
    /// Comma-separated violation codes (replaces the list)
    #[arg(long)]
    pub violations: Option<String>,
    #[arg(long)]
    pub docs_url: Option<String>,
    #[arg(long)]
    pub messenger: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// not-started, in-progress, paused or completed
    #[arg(long)]
    pub work_status: Option<String>,
    /// Stage id, or `none` to clear
    #[arg(long)]
    pub stage: Option<String>,
    /// 1-5, or `none` to clear
    #[arg(long)]
    pub delivery: Option<String>,
    #[arg(long)]
    pub operator: Option<String>,
    #[arg(long)]
    pub connection: Option<String>,
    #[arg(long)]
    pub tariff: Option<f64>,
}

#[derive(Args)]
pub struct ObjectAddArgs {
    pub name: String,
    #[command(flatten)]
    pub fields: ObjectFields,
    #[command(flatten)]
    pub scope: ProjectScope,
}

#[derive(Args)]
pub struct ObjectEditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: ObjectFields,
}

#[derive(Args)]
pub struct ViolationCmd {
    #[command(subcommand)]
    pub action: ViolationAction,
}

#[derive(Subcommand)]
pub enum ViolationAction {
    /// Record a violation code on an object
    Add(ViolationArgs),
    /// Remove a violation code from an object
    Rm(ViolationArgs),
}

#[derive(Args)]
pub struct ViolationArgs {
    /// Object ID
    pub id: String,
    /// Violation code, e.g. "12.9 ч.1"
    pub code: String,
}

// ---------------------------------------------------------------------------
// Selection and bulk edits
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SelectCmd {
    #[command(subcommand)]
    pub action: SelectAction,
}

#[derive(Subcommand)]
pub enum SelectAction {
    /// Toggle objects in or out of the selection
    Toggle(ToggleArgs),
    /// Select every visible object, or deselect them if all are selected
    All(ProjectScope),
    /// Empty the selection
    Clear,
    /// List selected objects
    Show,
}

#[derive(Args)]
pub struct ToggleArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct BulkCmd {
    #[command(subcommand)]
    pub action: BulkAction,
}

#[derive(Subcommand)]
pub enum BulkAction {
    /// Set the work status of every selected object
    Status(BulkStatusArgs),
    /// Replace the violation list of every selected object
    Violations(BulkViolationsArgs),
}

#[derive(Args)]
pub struct BulkStatusArgs {
    /// not-started, in-progress, paused or completed
    pub status: String,
}

#[derive(Args)]
pub struct BulkViolationsArgs {
    #[arg(required = true)]
    pub codes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Spreadsheets
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Export only selected objects of the project
    #[arg(long)]
    pub selected: bool,
    /// Output directory (default: export.dir from config, else current directory)
    #[arg(long)]
    pub out: Option<String>,
    #[command(flatten)]
    pub scope: ProjectScope,
}

#[derive(Args)]
pub struct ImportArgs {
    /// XLSX file to import
    pub file: String,
    #[command(flatten)]
    pub scope: ProjectScope,
}

// ---------------------------------------------------------------------------
// Status registry
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StatusCmd {
    #[command(subcommand)]
    pub action: StatusAction,
}

#[derive(Subcommand)]
pub enum StatusAction {
    /// List status options
    List,
    /// Change (or add) the label and color of one status
    Set(StatusSetArgs),
    /// Restore the default options
    Reset,
}

#[derive(Args)]
pub struct StatusSetArgs {
    /// not-started, in-progress, paused or completed
    pub value: String,
    #[arg(long)]
    pub label: Option<String>,
    /// Color name used for the badge classes (e.g. blue)
    #[arg(long)]
    pub color: Option<String>,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct LoginArgs {
    pub email: String,
    #[arg(long)]
    pub password: String,
    /// Verification code from the email; without it a code is requested
    #[arg(long)]
    pub code: Option<String>,
}

#[derive(Args)]
pub struct UsersCmd {
    #[command(subcommand)]
    pub action: UsersAction,
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List user accounts
    List,
    /// Create a user account
    Create(UserCreateArgs),
    /// Change name, role or active flag
    Update(UserUpdateArgs),
    /// Set a new password
    Passwd(UserPasswdArgs),
    /// Show the activity log
    Logs(LogsArgs),
}

#[derive(Args)]
pub struct UserCreateArgs {
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub name: String,
    /// admin or user
    #[arg(long, default_value = "user")]
    pub role: String,
}

#[derive(Args)]
pub struct UserUpdateArgs {
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Args)]
pub struct UserPasswdArgs {
    pub id: i64,
    #[arg(long)]
    pub password: String,
}

#[derive(Args)]
pub struct LogsArgs {
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(Args)]
pub struct ContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ColumnsCmd {
    #[command(subcommand)]
    pub action: Option<ColumnsAction>,
}

#[derive(Subcommand)]
pub enum ColumnsAction {
    /// List every column with its position and group (default)
    List,
    /// Append columns to the table
    Show(ColumnListArgs),
    /// Remove columns from the table
    Hide(ColumnListArgs),
    /// Move a shown column to a position (1 = first)
    Move(ColumnMoveArgs),
    /// Create a group, or set the columns of an existing one
    Group(ColumnGroupArgs),
    /// Delete a group; its columns stay shown
    Ungroup(GroupLabelArg),
    /// Fold a group into a single placeholder column
    Collapse(GroupLabelArg),
    /// Unfold a collapsed group
    Expand(GroupLabelArg),
    /// Restore the default columns and drop all groups
    Reset,
}

#[derive(Args)]
pub struct ColumnListArgs {
    /// Column keys or sheet labels
    #[arg(required = true)]
    pub columns: Vec<String>,
}

#[derive(Args)]
pub struct ColumnMoveArgs {
    pub column: String,
    pub position: usize,
}

#[derive(Args)]
pub struct ColumnGroupArgs {
    pub label: String,
    /// Column keys or sheet labels
    #[arg(required = true)]
    pub columns: Vec<String>,
}

#[derive(Args)]
pub struct GroupLabelArg {
    pub label: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a key, e.g. `sm config set stages.on_delete detach`
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}
