//! CLI commands

use std::io::{self, Write};

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use shopdesk_core::api::client::DEFAULT_ORDER_SORT;
use shopdesk_core::config::ENV_PASSWORD;
use shopdesk_core::models::{Member, NewUser, Product, ShoppingLog};
use shopdesk_core::{AdminSection, Route};
use tracing::debug;

use crate::app::{App, Outcome};
use crate::shell;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and open the page you were headed to
    Login {
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted without echo when not set)
        #[arg(long, env = ENV_PASSWORD, hide_env_values = true)]
        password: Option<String>,

        /// Page to open after signing in, e.g. /pages/member-info
        #[arg(long)]
        return_to: Option<Route>,
    },

    /// Invalidate the session and sign out
    Logout,

    /// Show the backend address and whether you are signed in
    Status,

    /// Open any page by path
    Open {
        path: Route,

        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// Browse the product catalog
    Products {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// Show your account details
    Member,

    /// Show your order history
    Orders {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// Administration screens and actions
    Admin {
        #[command(subcommand)]
        command: Option<AdminCommands>,
    },

    /// Interactive session
    Shell,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List members
    Members {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Add, edit or remove a member
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// List products
    Products {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// Add, edit or remove a product
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// List all orders
    Orders {
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Sort as field[,asc|desc]
        #[arg(long, default_value = DEFAULT_ORDER_SORT)]
        sort: String,
    },
    /// Remove an order
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },

    /// List roles
    Roles,
    /// Add, rename or remove a role
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// List system users and their roles
    Users,
    /// Add or remove a system user, or revoke one of its roles
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// List shopping logs
    Logs,
    /// Add, edit or remove a shopping log
    Log {
        #[command(subcommand)]
        action: LogAction,
    },
}

#[derive(Args, Default)]
pub struct MemberDetails {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

#[derive(Subcommand)]
pub enum MemberAction {
    Add {
        #[arg(long)]
        username: String,
        /// Prompted when not set
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        details: MemberDetails,
    },
    Edit {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        details: MemberDetails,
    },
    Rm {
        id: i64,
    },
}

#[derive(Args, Default)]
pub struct ProductDetails {
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<i64>,
    #[arg(long)]
    stock: Option<i64>,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Subcommand)]
pub enum ProductAction {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[command(flatten)]
        details: ProductDetails,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[command(flatten)]
        details: ProductDetails,
    },
    Rm {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum OrderAction {
    Rm { id: i64 },
}

#[derive(Subcommand)]
pub enum RoleAction {
    Add { name: String },
    Edit { id: i64, name: String },
    Rm { id: i64 },
}

#[derive(Subcommand)]
pub enum UserAction {
    Add {
        #[arg(long)]
        username: String,
        /// Prompted when not set
        #[arg(long)]
        password: Option<String>,
        /// Role name to grant; repeatable
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    Rm {
        id: i64,
    },
    /// Revoke one role from a user
    Revoke {
        user_id: i64,
        role_id: i64,
    },
}

#[derive(Subcommand)]
pub enum LogAction {
    Add {
        #[arg(long)]
        action: String,
        #[arg(long)]
        member: Option<i64>,
        #[arg(long)]
        details: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        member: Option<i64>,
        #[arg(long)]
        details: Option<String>,
    },
    Rm {
        id: i64,
    },
}

// ============================================================================
// Prompts
// ============================================================================

/// Ask for a username, offering `default` on empty input.
pub fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(choose_username(&input, default))
}

pub(crate) fn choose_username(input: &str, default: Option<&str>) -> String {
    match (input.trim(), default) {
        ("", Some(last)) => last.to_string(),
        (typed, _) => typed.to_string(),
    }
}

pub fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(p) => Ok(p),
        None => prompt_password(),
    }
}

fn print_outcome(outcome: &Outcome) {
    let text = outcome.render();
    if outcome.is_ok() {
        print!("{}", text);
    } else {
        eprint!("{}", text);
    }
}

/// Log in with the given credentials and open the return-to destination.
pub async fn sign_in(app: &mut App, username: String, password: String) -> Result<bool> {
    if username.is_empty() || password.is_empty() {
        eprintln!("Username and password required");
        return Ok(false);
    }

    println!("Authenticating...");
    match app.login(&username, &password).await {
        Ok(destination) => {
            app.remember_username(&username);
            println!("Login successful!\n");
            let outcome = app.open(destination, 0).await;
            print_outcome(&outcome);
            Ok(outcome.is_ok())
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(false)
        }
    }
}

pub async fn sign_out(app: &mut App) -> bool {
    match app.logout().await {
        Ok(()) => {
            println!("Logged out.");
            true
        }
        // The server already ended the session; the gateway cleared it locally
        Err(e) if e.is_auth_failure() => {
            println!("Logged out.");
            true
        }
        Err(e) => {
            eprintln!("Logout failed: {}", e);
            false
        }
    }
}

pub fn status(app: &mut App) -> String {
    let state = if app.is_authenticated() {
        "signed in"
    } else {
        "signed out"
    };
    let user = app.last_username().unwrap_or("-").to_string();
    format!(
        "Backend: {}\nSession: {} (last user: {})\nPage:    {}\n",
        app.client().gateway().base_url(),
        state,
        user,
        app.navigator().route()
    )
}

impl Commands {
    /// Run the command. Returns false when the screen could not be shown.
    pub async fn execute(self, app: &mut App) -> Result<bool> {
        match self {
            Commands::Login {
                username,
                password,
                return_to,
            } => {
                app.begin_login(return_to);
                let username = match username {
                    Some(u) => u,
                    None => prompt_username(app.last_username())?,
                };
                let password = password_or_prompt(password)?;
                sign_in(app, username, password).await
            }
            Commands::Logout => Ok(sign_out(app).await),
            Commands::Status => {
                print!("{}", status(app));
                Ok(true)
            }
            Commands::Open { path, page } => Ok(show(app, path, page).await),
            Commands::Products { page } => Ok(show(app, Route::Products, page).await),
            Commands::Member => Ok(show(app, Route::MemberInfo, 0).await),
            Commands::Orders { page } => Ok(show(app, Route::OrderHistory, page).await),
            Commands::Admin { command: None } => Ok(show(app, Route::AdminHome, 0).await),
            Commands::Admin {
                command: Some(command),
            } => command.execute(app).await,
            Commands::Shell => {
                shell::run(app).await?;
                Ok(true)
            }
        }
    }
}

async fn show(app: &mut App, route: Route, page: u32) -> bool {
    let outcome = app.open(route, page).await;
    print_outcome(&outcome);
    outcome.is_ok()
}

/// Print the mutation result, then the refreshed list on success.
async fn after_mutation(app: &mut App, outcome: Outcome) -> bool {
    print_outcome(&outcome);
    match outcome {
        Outcome::Done { route, .. } => show(app, route, 0).await,
        _ => false,
    }
}

impl AdminCommands {
    pub async fn execute(self, app: &mut App) -> Result<bool> {
        let outcome = match self {
            AdminCommands::Members { page } => {
                return Ok(show(app, Route::Admin(AdminSection::Members), page).await)
            }
            AdminCommands::Products { page } => {
                return Ok(show(app, Route::Admin(AdminSection::Products), page).await)
            }
            AdminCommands::Orders { page, sort } => {
                app.set_order_sort(sort);
                return Ok(show(app, Route::Admin(AdminSection::Orders), page).await);
            }
            AdminCommands::Roles => return Ok(show(app, Route::Admin(AdminSection::Roles), 0).await),
            AdminCommands::Users => return Ok(show(app, Route::Admin(AdminSection::Users), 0).await),
            AdminCommands::Logs => {
                return Ok(show(app, Route::Admin(AdminSection::ShoppingLogs), 0).await)
            }
            AdminCommands::Member { action } => member_action(app, action).await?,
            AdminCommands::Product { action } => product_action(app, action).await,
            AdminCommands::Order { action } => match action {
                OrderAction::Rm { id } => {
                    app.mutate(AdminSection::Orders, |api| async move {
                        api.delete_order(id).await?;
                        Ok(format!("Order {} deleted.", id))
                    })
                    .await
                }
            },
            AdminCommands::Role { action } => role_action(app, action).await,
            AdminCommands::User { action } => user_action(app, action).await?,
            AdminCommands::Log { action } => log_action(app, action).await,
        };

        Ok(after_mutation(app, outcome).await)
    }
}

fn apply_member_details(member: &mut Member, details: MemberDetails) {
    if details.email.is_some() {
        member.email = details.email;
    }
    if details.phone.is_some() {
        member.phone_number = details.phone;
    }
    if details.address.is_some() {
        member.address = details.address;
    }
}

async fn member_action(app: &mut App, action: MemberAction) -> Result<Outcome> {
    let outcome = match action {
        MemberAction::Add {
            username,
            password,
            details,
        } => {
            let mut member = Member {
                username,
                password: Some(password_or_prompt(password)?),
                ..Default::default()
            };
            apply_member_details(&mut member, details);
            app.mutate(AdminSection::Members, |api| async move {
                let created = api.create_member(&member).await?;
                Ok(format!("Member {} added.", created.username))
            })
            .await
        }
        MemberAction::Edit {
            id,
            username,
            password,
            details,
        } => {
            app.mutate(AdminSection::Members, |api| async move {
                let mut member = api.member(id).await?;
                if let Some(username) = username {
                    member.username = username;
                }
                member.password = password;
                apply_member_details(&mut member, details);
                api.update_member(id, &member).await?;
                Ok(format!("Member {} updated.", id))
            })
            .await
        }
        MemberAction::Rm { id } => {
            app.mutate(AdminSection::Members, |api| async move {
                api.delete_member(id).await?;
                Ok(format!("Member {} deleted.", id))
            })
            .await
        }
    };
    Ok(outcome)
}

fn apply_product_details(product: &mut Product, details: ProductDetails) {
    if details.description.is_some() {
        product.description = details.description;
    }
    if details.category.is_some() {
        product.category_id = details.category;
    }
    if details.stock.is_some() {
        product.stock_quantity = details.stock;
    }
    if details.image_url.is_some() {
        product.image_url = details.image_url;
    }
}

async fn product_action(app: &mut App, action: ProductAction) -> Outcome {
    match action {
        ProductAction::Add {
            name,
            price,
            details,
        } => {
            let mut product = Product {
                name,
                price,
                ..Default::default()
            };
            apply_product_details(&mut product, details);
            app.mutate(AdminSection::Products, |api| async move {
                let created = api.create_product(&product).await?;
                Ok(format!("Product {} added.", created.name))
            })
            .await
        }
        ProductAction::Edit {
            id,
            name,
            price,
            details,
        } => {
            app.mutate(AdminSection::Products, |api| async move {
                let mut product = api.product(id).await?;
                if let Some(name) = name {
                    product.name = name;
                }
                if let Some(price) = price {
                    product.price = price;
                }
                apply_product_details(&mut product, details);
                api.update_product(id, &product).await?;
                Ok(format!("Product {} updated.", id))
            })
            .await
        }
        ProductAction::Rm { id } => {
            app.mutate(AdminSection::Products, |api| async move {
                api.delete_product(id).await?;
                Ok(format!("Product {} deleted.", id))
            })
            .await
        }
    }
}

async fn role_action(app: &mut App, action: RoleAction) -> Outcome {
    match action {
        RoleAction::Add { name } => {
            app.mutate(AdminSection::Roles, |api| async move {
                let role = api.create_role(&name).await?;
                Ok(format!("Role {} added.", role.name))
            })
            .await
        }
        RoleAction::Edit { id, name } => {
            app.mutate(AdminSection::Roles, |api| async move {
                let role = api.update_role(id, &name).await?;
                Ok(format!("Role {} renamed to {}.", id, role.name))
            })
            .await
        }
        RoleAction::Rm { id } => {
            app.mutate(AdminSection::Roles, |api| async move {
                api.delete_role(id).await?;
                Ok(format!("Role {} deleted.", id))
            })
            .await
        }
    }
}

async fn user_action(app: &mut App, action: UserAction) -> Result<Outcome> {
    let outcome = match action {
        UserAction::Add {
            username,
            password,
            roles,
        } => {
            let password = password_or_prompt(password)?;
            app.mutate(AdminSection::Users, |api| async move {
                let available = api.roles().await?;
                let roles = roles
                    .iter()
                    .map(|name| {
                        available
                            .iter()
                            .find(|r| r.name.eq_ignore_ascii_case(name))
                            .cloned()
                            .ok_or_else(|| anyhow!("Unknown role: {}", name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                debug!(username = %username, roles = roles.len(), "Creating user");

                let user = NewUser {
                    username,
                    password,
                    roles,
                };
                let created = api.create_user(&user).await?;
                Ok(format!("User {} added.", created.username))
            })
            .await
        }
        UserAction::Rm { id } => {
            app.mutate(AdminSection::Users, |api| async move {
                api.delete_user(id).await?;
                Ok(format!("User {} deleted.", id))
            })
            .await
        }
        UserAction::Revoke { user_id, role_id } => {
            app.mutate(AdminSection::Users, |api| async move {
                api.remove_user_role(user_id, role_id).await?;
                Ok(format!("Role {} revoked from user {}.", role_id, user_id))
            })
            .await
        }
    };
    Ok(outcome)
}

async fn log_action(app: &mut App, action: LogAction) -> Outcome {
    match action {
        LogAction::Add {
            action,
            member,
            details,
        } => {
            let log = ShoppingLog {
                id: None,
                member_id: member,
                action,
                details,
            };
            app.mutate(AdminSection::ShoppingLogs, |api| async move {
                let created = api.create_shopping_log(&log).await?;
                Ok(format!("Shopping log {} added.", created.action))
            })
            .await
        }
        LogAction::Edit {
            id,
            action,
            member,
            details,
        } => {
            app.mutate(AdminSection::ShoppingLogs, |api| async move {
                let Some(mut log) = api
                    .shopping_logs()
                    .await?
                    .into_iter()
                    .find(|l| l.id == Some(id))
                else {
                    bail!("Shopping log {} not found", id);
                };
                if let Some(action) = action {
                    log.action = action;
                }
                if member.is_some() {
                    log.member_id = member;
                }
                if details.is_some() {
                    log.details = details;
                }
                api.update_shopping_log(id, &log).await?;
                Ok(format!("Shopping log {} updated.", id))
            })
            .await
        }
        LogAction::Rm { id } => {
            app.mutate(AdminSection::ShoppingLogs, |api| async move {
                api.delete_shopping_log(id).await?;
                Ok(format!("Shopping log {} deleted.", id))
            })
            .await
        }
    }
}
