use anyhow::{anyhow, Context, Result};
use std::env;

use client_roster::{
    format_money, load_until_closed, or_unavailable, AppConfig, ClientDetail, ClientDirectory,
    ClientPage, EmptyState, IdentityDocument, JsonFileSessionStore, LoadState, SessionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env()?;
    let directory = ClientDirectory::from_config(&config)?;

    match args.get(1).map(String::as_str) {
        Some("detail") => {
            let id = args.get(2).ok_or_else(|| anyhow!("usage: client-roster detail <id>"))?;
            run_detail(&directory, id).await
        }
        Some("stats") => run_stats(&directory).await,
        Some("reset") => {
            JsonFileSessionStore::new(&config.session_file).clear()?;
            println!("✓ Listing state cleared");
            Ok(())
        }
        Some("list") | None => {
            // list [--search TEXT] [--page N]
            let (search, page) = parse_list_args(&args[args.len().min(2)..])?;
            run_list(&directory, &config, search.as_deref(), page).await
        }
        Some(other) => Err(anyhow!(
            "Unknown command '{}'. Commands: list, detail <id>, stats, reset",
            other
        )),
    }
}

fn parse_list_args(args: &[String]) -> Result<(Option<String>, Option<i64>)> {
    let mut search = None;
    let mut page = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--search" | "-s" => {
                search = Some(iter.next().cloned().unwrap_or_default());
            }
            "--page" | "-p" => {
                let value = iter.next().ok_or_else(|| anyhow!("--page needs a number"))?;
                page = Some(value.parse::<i64>().context("--page needs a number")?);
            }
            other => return Err(anyhow!("Unknown option '{}'", other)),
        }
    }

    Ok((search, page))
}

async fn run_list(
    directory: &ClientDirectory,
    config: &AppConfig,
    search: Option<&str>,
    page: Option<i64>,
) -> Result<()> {
    let mut store = JsonFileSessionStore::new(&config.session_file);

    let state = load_until_closed(
        directory.list_clients(&mut store, search, page),
        tokio::signal::ctrl_c(),
    )
    .await;
    match state {
        LoadState::Loaded(page) => {
            print_page(&page);
            Ok(())
        }
        LoadState::Failed(message) => Err(anyhow!("Could not load clients: {}", message)),
        LoadState::Loading => interrupted(),
    }
}

/// Ctrl-C closed the view before the load finished
fn interrupted() -> Result<()> {
    eprintln!("Interrompido.");
    Ok(())
}

fn print_page(page: &ClientPage) {
    println!("📋 Lista de Clientes");
    if !page.search_text.is_empty() {
        println!("   busca: \"{}\"", page.search_text);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match &page.empty_state {
        Some(EmptyState::NoData) => println!("Nenhum cliente cadastrado ainda."),
        Some(EmptyState::NoMatches { query }) => {
            println!("Nenhum cliente encontrado para \"{}\".", query)
        }
        None => {
            for client in &page.items {
                let name = if client.name.is_empty() {
                    "Nome não informado"
                } else {
                    client.name.as_str()
                };
                let tax_id = client.tax_id.as_deref().unwrap_or("CPF/CNPJ não informado");
                println!("{:<10} {:<40} {}", client.id, name, tax_id);
            }
        }
    }

    if page.total_pages > 1 {
        println!(
            "\nPágina {} de {} ({} clientes)",
            page.current_page, page.total_pages, page.filtered_count
        );
    }
}

async fn run_detail(directory: &ClientDirectory, id: &str) -> Result<()> {
    let state =
        load_until_closed(directory.get_client_detail(id), tokio::signal::ctrl_c()).await;
    match state {
        LoadState::Loaded(Some(detail)) => {
            print_detail(&detail);
            Ok(())
        }
        LoadState::Loaded(None) => {
            println!("Cliente não encontrado.");
            Ok(())
        }
        LoadState::Failed(message) => Err(anyhow!("Could not load client {}: {}", id, message)),
        LoadState::Loading => interrupted(),
    }
}

fn print_detail(detail: &ClientDetail) {
    let client = &detail.client;

    println!("👤 {}", client.display_name().unwrap_or("Nome não informado"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", client.email.as_deref().unwrap_or("Email não informado"));
    match client.identity_document() {
        Some(IdentityDocument::TaxId(tax_id)) => println!("CPF/CNPJ: {}", tax_id),
        Some(IdentityDocument::NationalId(rg)) => println!("RG: {}", rg),
        None => println!("CPF/CNPJ ou RG não informado"),
    }
    println!(
        "Data de nascimento: {}",
        client.birth_date_display().as_deref().unwrap_or("Não informada")
    );
    println!("Renda anual: {}", format_money(client.annual_income));
    println!("Patrimônio: {}", format_money(client.net_worth));
    println!("Estado civil: {}", or_unavailable(client.marital_status.as_deref()));
    println!("Endereço: {}", or_unavailable(client.address.as_deref()));

    println!("\n💳 Contas bancárias");
    if detail.accounts.is_empty() {
        println!("Este cliente não possui contas cadastradas.");
    }
    for account in &detail.accounts {
        println!(
            "- {}: saldo {}, limite {}, disponível {}",
            account.kind.as_deref().unwrap_or("Tipo não informado"),
            format_money(account.balance),
            format_money(account.credit_limit),
            format_money(account.available_credit),
        );
    }

    println!("\n🏦 Agência");
    match &detail.agency {
        Some(agency) => {
            println!("Nome: {}", or_unavailable(agency.name.as_deref()));
            println!("Endereço: {}", or_unavailable(agency.address.as_deref()));
        }
        None => println!("Agência não identificada ou não vinculada."),
    }
}

async fn run_stats(directory: &ClientDirectory) -> Result<()> {
    let summary = directory.summary().await.context("Could not load statistics")?;

    println!("Total de Clientes: {}", summary.total_clients);
    println!("Contas Corrente: {}", summary.checking_accounts);
    println!("Contas Poupança: {}", summary.savings_accounts);
    Ok(())
}
