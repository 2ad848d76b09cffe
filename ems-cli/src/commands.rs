//! Command handlers

use anyhow::{Context, bail};
use ems_client::views::{EmployeeForm, FormField};
use ems_client::{EmsContext, ImageFile, ParamsPatch, ThemeMode, User};

use crate::cli::{Command, EmployeeArgs, EmployeeCommand, ProfileArgs, SessionCommand, ThemeAction};
use crate::output;

const LOGIN_PATH: &str = "/login";

pub async fn run(ctx: &EmsContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => login(ctx, &username, &password).await,
        Command::Theme { action } => {
            theme(ctx, action);
            Ok(())
        }
        Command::Session(command) => {
            let user = require_session(ctx).await?;
            let result = authenticated(ctx, user, command).await;
            // 401 拦截器已清空会话并跳到登录页
            if ctx.history.location().path() == LOGIN_PATH {
                bail!("Session expired. Run `ems login <username>` again.");
            }
            result
        }
    }
}

async fn require_session(ctx: &EmsContext) -> anyhow::Result<User> {
    match ctx.session.bootstrap().await {
        Some(user) => Ok(user),
        None => bail!("Not logged in. Run `ems login <username>` first."),
    }
}

async fn authenticated(ctx: &EmsContext, user: User, command: SessionCommand) -> anyhow::Result<()> {
    match command {
        SessionCommand::Logout => {
            ctx.session.logout().await;
            println!("Logged out {}", user.username);
        }
        SessionCommand::Whoami => println!("{}", output::user(&user)),
        SessionCommand::Profile(args) => profile(ctx, &user, args).await?,
        SessionCommand::Employees(command) => employees(ctx, command).await?,
        SessionCommand::Divisions => {
            let divisions = ctx.employee_list().divisions().await?;
            println!("{}", output::divisions(&divisions));
        }
        SessionCommand::Dashboard => {
            ctx.navigate("/")?;
            let summary = ctx.dashboard().load().await?;
            println!("{}", output::dashboard(&summary));
        }
    }
    Ok(())
}

// ========== Session ==========

async fn login(ctx: &EmsContext, username: &str, password: &str) -> anyhow::Result<()> {
    ctx.navigate(LOGIN_PATH)?;
    let outcome = ctx.session.login(username, password).await;
    if let Some(error) = outcome.error {
        bail!(error);
    }
    match ctx.session.user() {
        Some(user) => println!("Logged in as {}", output::user(&user)),
        None => println!("Logged in"),
    }
    Ok(())
}

async fn profile(ctx: &EmsContext, user: &User, args: ProfileArgs) -> anyhow::Result<()> {
    ctx.navigate("/profile")?;
    let mut form = ctx.profile_form();
    let ProfileArgs {
        name,
        username,
        phone,
        email,
        password,
        password_confirmation,
    } = args;

    let changed = name.is_some()
        || username.is_some()
        || phone.is_some()
        || email.is_some()
        || password.is_some();
    if !changed {
        println!("{}", output::user(user));
        return Ok(());
    }

    if let Some(name) = name {
        form.name = name;
    }
    if let Some(username) = username {
        form.username = username;
    }
    if let Some(phone) = phone {
        form.phone = phone;
    }
    if let Some(email) = email {
        form.email = email;
    }
    if let Some(password) = password {
        form.password = password;
        form.password_confirmation = password_confirmation.unwrap_or_default();
    }

    if !form.submit(&ctx.session).await {
        bail!(form.error_message().unwrap_or("Failed to update profile").to_string());
    }
    if let Some(message) = form.success_message() {
        println!("{message}");
    }
    Ok(())
}

fn theme(ctx: &EmsContext, action: Option<ThemeAction>) {
    let mode = match action {
        None => ctx.theme.mode(),
        Some(ThemeAction::Toggle) => ctx.theme.toggle(),
        Some(action) => {
            let mode = match action {
                ThemeAction::Light => ThemeMode::Light,
                ThemeAction::Dark => ThemeMode::Dark,
                _ => ThemeMode::System,
            };
            ctx.theme.set_mode(mode);
            mode
        }
    };
    let effective = if ctx.theme.is_dark() { "dark" } else { "light" };
    println!("theme: {} ({effective})", mode.as_str());
}

// ========== Employees ==========

async fn employees(ctx: &EmsContext, command: EmployeeCommand) -> anyhow::Result<()> {
    match command {
        EmployeeCommand::List {
            page,
            search,
            division,
        } => {
            ctx.navigate("/employees")?;
            ctx.params().set_params(ParamsPatch {
                page: Some(page),
                search,
                division,
            });
            let view = ctx.employee_list().load().await;
            if let Some(error) = view.error {
                bail!(error);
            }
            println!("{}", output::employee_list(&view));
        }
        EmployeeCommand::Show { id } => {
            let employee = ctx
                .employees
                .find(&id)
                .await?
                .with_context(|| format!("Employee {id} not found"))?;
            println!("{}", output::employee(&employee));
        }
        EmployeeCommand::Create(fields) => {
            ctx.navigate("/employees/create")?;
            let mut form = ctx.create_employee_form();
            form.load().await?;
            fill(&mut form, fields).await?;
            submit(&mut form).await?;
            println!("Employee added");
        }
        EmployeeCommand::Update { id, fields } => {
            ctx.navigate(&format!("/employees/{id}/edit"))?;
            let mut form = ctx.edit_employee_form(&id);
            form.load().await?;
            if form.not_found() {
                bail!("Employee {id} not found");
            }
            fill(&mut form, fields).await?;
            submit(&mut form).await?;
            println!("Employee updated");
        }
        EmployeeCommand::Delete { id } => {
            ctx.navigate("/employees")?;
            let employee = ctx
                .employees
                .find(&id)
                .await?
                .with_context(|| format!("Employee {id} not found"))?;
            let list = ctx.employee_list();
            list.request_delete(employee.clone());
            list.confirm_delete().await?;
            println!("Deleted {}", employee.name);
        }
    }
    Ok(())
}

async fn fill(form: &mut EmployeeForm, fields: EmployeeArgs) -> anyhow::Result<()> {
    let EmployeeArgs {
        name,
        phone,
        division,
        position,
        image,
    } = fields;

    for (field, value) in [
        (FormField::Name, name),
        (FormField::Phone, phone),
        (FormField::Division, division),
        (FormField::Position, position),
    ] {
        if let Some(value) = value {
            form.set_field(field, value);
        }
    }
    if let Some(path) = image {
        let file = ImageFile::from_path(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        form.select_image(file).await?;
    }
    Ok(())
}

async fn submit(form: &mut EmployeeForm) -> anyhow::Result<()> {
    if form.submit().await {
        return Ok(());
    }
    if let Some(error) = form.server_error() {
        bail!(error.to_string());
    }
    let errors: Vec<&str> = form.errors().values().map(String::as_str).collect();
    if errors.is_empty() {
        bail!("Request already in progress");
    }
    bail!(errors.join("; "))
}
