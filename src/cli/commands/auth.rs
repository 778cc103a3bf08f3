//! Login, logout and whoami

use crate::cli::context::Context;
use crate::cli::render::{employee_card, print_json};
use crate::cli::GlobalOpts;
use crate::errors::Result;

pub async fn login(opts: &GlobalOpts, token: &str) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.service.authorize(token, &ctx.session)?;
    println!("✅ Вы вошли как {} ({})", employee.full_name, employee.role.label());
    Ok(())
}

pub async fn logout(opts: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(opts)?;
    match ctx.service.logout(&ctx.session)? {
        Some(employee) => println!("👋 До свидания, {}", employee.full_name),
        None => println!("Сессия не была авторизована"),
    }
    Ok(())
}

pub async fn whoami(opts: &GlobalOpts, json: bool) -> Result<()> {
    let ctx = Context::open(opts)?;
    let employee = ctx.employee()?;
    if json {
        return print_json(&employee);
    }
    println!("{}", employee_card(&employee));
    Ok(())
}
