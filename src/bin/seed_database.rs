#!/usr/bin/env cargo
//! Greenhouse Database Seeder
//!
//! A terminal application for filling a running greenhouse API with realistic
//! demo data: greenhouses, growing cycles at various stages, weekly harvests,
//! maintenance activities, inventory stock and its recorded usage.
//!
//! Usage:
//!   `cargo run --bin seed_database -- --url http://localhost:3000 --username grower --password secret`
//!
//! Pass `--signup` to create the account first, or `--token` to reuse an existing key.
//! All writes go through the public API so every business rule is exercised.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use clap::{Arg, ArgAction, Command};
use console::style;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{Duration, sleep};

type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone)]
pub struct SeedingConfig {
    pub base_url: String,
    pub token: String,
    pub client: Client,
}

#[derive(Debug, Default)]
pub struct CreatedObjects {
    pub greenhouses: Vec<Value>,
    pub growing_cycles: Vec<Value>,
    pub harvests: Vec<Value>,
    pub maintenance_activities: Vec<Value>,
    pub inventory_items: Vec<Value>,
    pub usage_records: Vec<Value>,
}

pub struct DatabaseSeeder {
    config: SeedingConfig,
    created_objects: CreatedObjects,
}

fn progress_bar(len: usize) -> SeedResult<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}",
            )?
            .progress_chars("##-"),
    );
    Ok(pb)
}

fn id_of(value: &Value) -> SeedResult<String> {
    value["id"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| format!("Response has no id: {value}").into())
}

async fn send(
    config: &SeedingConfig,
    method: Method,
    endpoint: &str,
    data: Option<Value>,
) -> Result<Value, String> {
    let url = format!("{}{}", config.base_url, endpoint);
    let mut request = config.client.request(method, &url);
    if !config.token.is_empty() {
        request = request.header("authorization", format!("Token {}", config.token));
    }
    if let Some(json_data) = data {
        request = request.json(&json_data);
    }

    let response = request
        .send()
        .await
        .map_err(|e| format!("Request error {endpoint}: {e}"))?;

    if response.status().is_success() {
        response
            .json::<Value>()
            .await
            .map_err(|e| format!("JSON parse error: {e}"))
    } else {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        Err(format!("HTTP {status} {endpoint}: {error_text}"))
    }
}

impl DatabaseSeeder {
    pub fn new(base_url: &str, token: String) -> SeedResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            config: SeedingConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
                client,
            },
            created_objects: CreatedObjects::default(),
        })
    }

    async fn make_request(&self, method: Method, endpoint: &str, data: Option<Value>) -> SeedResult<Value> {
        Ok(send(&self.config, method, endpoint, data).await?)
    }

    /// Make multiple POST requests in parallel with controlled concurrency
    async fn make_parallel_requests(
        &self,
        requests: Vec<(String, Value)>, // (endpoint, data)
        max_concurrent: usize,
        pb: &ProgressBar,
    ) -> Result<Vec<Value>, String> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut tasks = Vec::new();

        for (endpoint, data) in requests {
            let sem = Arc::clone(&semaphore);
            let config = self.config.clone();
            let pb_clone = pb.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| format!("Semaphore closed: {e}"))?;
                let result = send(&config, Method::POST, &endpoint, Some(data)).await;
                pb_clone.inc(1);
                result
            }));
        }

        join_all(tasks)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("Task join error: {e}"))?
            .into_iter()
            .collect()
    }

    /// Exchanges credentials for an API token, optionally creating the account first
    pub async fn login(&mut self, username: &str, password: &str, signup: bool) -> SeedResult<()> {
        if signup {
            match self
                .make_request(
                    Method::POST,
                    "/api/users",
                    Some(json!({
                        "username": username,
                        "password": password,
                        "first_name": "Demo",
                        "last_name": "Grower"
                    })),
                )
                .await
            {
                Ok(_) => println!("{} Created user {}", style("✅").green(), style(username).cyan()),
                Err(e) => println!("{} Signup skipped: {e}", style("⚠️").yellow()),
            }
        }

        let response = self
            .make_request(
                Method::POST,
                "/api/auth/token",
                Some(json!({"username": username, "password": password})),
            )
            .await?;
        self.config.token = response["token"]
            .as_str()
            .ok_or("Login response has no token")?
            .to_string();
        println!("{} Logged in as {}", style("🔑").cyan(), style(username).cyan());
        Ok(())
    }

    pub async fn create_greenhouses(&mut self) -> SeedResult<()> {
        println!("{} Creating greenhouses...", style("[1/6]").bold().dim());

        let greenhouses_data = vec![
            json!({"name": "North Glasshouse", "location": "Field A, north edge", "size": 420.0}),
            json!({"name": "Tunnel 2", "location": "Field A, row 2", "size": 180.5}),
            json!({"name": "Propagation House", "location": "Main yard", "size": 95.0}),
            json!({"name": "South Venlo", "location": "Field B", "size": 640.25}),
            json!({"name": "Research Bay", "location": "Lab annex", "size": 60.0}),
        ];

        let pb = progress_bar(greenhouses_data.len())?;
        for greenhouse_data in greenhouses_data {
            let name = greenhouse_data["name"].as_str().unwrap_or_default().to_string();
            pb.set_message(format!("Creating: {name}"));

            let result = self
                .make_request(Method::POST, "/api/greenhouses", Some(greenhouse_data))
                .await?;
            self.created_objects.greenhouses.push(result);

            pb.inc(1);
            sleep(Duration::from_millis(50)).await;
        }

        pb.finish_with_message("Greenhouses created!");
        println!(
            "{} Created {} greenhouses",
            style("✅").green(),
            self.created_objects.greenhouses.len()
        );
        Ok(())
    }

    /// Plants every greenhouse but the last and spreads the cycles over the five stages
    pub async fn start_plantings(&mut self) -> SeedResult<()> {
        println!("{} Starting plantings...", style("[2/6]").bold().dim());

        let crops = [
            ("Tomato", "Heirloom"),
            ("Cucumber", "F1 hybrid"),
            ("Basil", "Genovese"),
            ("Pepper", "California Wonder"),
        ];
        let today = Utc::now().date_naive();
        let planted: Vec<String> = self
            .created_objects
            .greenhouses
            .iter()
            .take(crops.len())
            .map(id_of)
            .collect::<SeedResult<_>>()?;

        let pb = progress_bar(planted.len())?;
        let mut rng = rand::rng();
        for (index, (greenhouse_id, (crop, seed))) in planted.iter().zip(crops).enumerate() {
            pb.set_message(format!("Planting: {crop}"));

            let weeks_ago = rng.random_range(2..=12);
            let planting_date: NaiveDate = today - ChronoDuration::weeks(weeks_ago);
            let expected = planting_date + ChronoDuration::weeks(14);

            self.make_request(
                    Method::POST,
                    &format!("/api/greenhouses/{greenhouse_id}/start_planting"),
                    Some(json!({
                        "crop_name": crop,
                        "seed_type": seed,
                        "planting_date": planting_date.to_string(),
                        "expected_harvest_date": expected.to_string(),
                        "notes": format!("Seeded demo cycle for {crop}")
                    })),
                )
                .await?;

            let stage = i64::try_from(index % 5 + 2).unwrap_or(1);
            let greenhouse = self
                .make_request(
                    Method::PATCH,
                    &format!("/api/greenhouses/{greenhouse_id}/update_stage"),
                    Some(json!({"stage": stage})),
                )
                .await?;

            self.created_objects
                .growing_cycles
                .push(greenhouse["current_cycle"].clone());
            pb.inc(1);
        }

        pb.finish_with_message("Plantings started!");
        println!(
            "{} Started {} growing cycles",
            style("✅").green(),
            self.created_objects.growing_cycles.len()
        );
        Ok(())
    }

    pub async fn create_harvests(&mut self) -> SeedResult<()> {
        println!("{} Recording weekly harvests...", style("[3/6]").bold().dim());

        let mut requests = Vec::new();
        let mut rng = rand::rng();
        for cycle in &self.created_objects.growing_cycles {
            let cycle_id = id_of(cycle)?;
            let planting_date = cycle["planting_date"]
                .as_str()
                .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
                .ok_or("Growing cycle has no planting date")?;

            for week in 1..=rng.random_range(1..=4) {
                let quality = ["good", "good", "medium", "bad"][rng.random_range(0..4)];
                requests.push((
                    "/api/harvests".to_string(),
                    json!({
                        "growing_cycle_id": cycle_id,
                        "week_number": week,
                        "harvest_date": (planting_date + ChronoDuration::weeks(i64::from(week))).to_string(),
                        "weight": (rng.random::<f64>() * 40.0 + 5.0).round(),
                        "quality": quality
                    }),
                ));
            }
        }

        let pb = progress_bar(requests.len())?;
        pb.set_message("Creating harvests in parallel");
        let results = self.make_parallel_requests(requests, 4, &pb).await?;
        self.created_objects.harvests.extend(results);

        pb.finish_with_message("Harvests recorded!");
        println!(
            "{} Recorded {} weekly harvests",
            style("✅").green(),
            self.created_objects.harvests.len()
        );
        Ok(())
    }

    pub async fn create_maintenance(&mut self) -> SeedResult<()> {
        println!("{} Scheduling maintenance...", style("[4/6]").bold().dim());

        let activities = [
            ("cleaning", "planned", "Wash glazing and benches"),
            ("repair", "unplanned", "Replace torn shade screen"),
            ("cleaning", "planned", "Disinfect irrigation lines"),
        ];
        let today = Utc::now().date_naive();

        let pb = progress_bar(self.created_objects.greenhouses.len())?;
        for (index, greenhouse) in self.created_objects.greenhouses.iter().enumerate() {
            let (activity_type, schedule, description) = activities[index % activities.len()];
            let days = i64::try_from(index * 3).unwrap_or_default();
            let result = self
                .make_request(
                    Method::POST,
                    "/api/maintenance",
                    Some(json!({
                        "greenhouse_id": id_of(greenhouse)?,
                        "activity_type": activity_type,
                        "schedule": schedule,
                        "scheduled_date": (today + ChronoDuration::days(days)).to_string(),
                        "description": description
                    })),
                )
                .await?;
            self.created_objects.maintenance_activities.push(result);
            pb.inc(1);
        }

        pb.finish_with_message("Maintenance scheduled!");
        println!(
            "{} Scheduled {} maintenance activities",
            style("✅").green(),
            self.created_objects.maintenance_activities.len()
        );
        Ok(())
    }

    pub async fn create_inventory(&mut self) -> SeedResult<()> {
        println!("{} Stocking inventory...", style("[5/6]").bold().dim());

        let items = vec![
            json!({"name": "NPK 20-20-20", "current_quantity": 50.0, "unit": "kg", "concentration": "20%"}),
            json!({"name": "Neem oil", "current_quantity": 12.0, "unit": "l", "concentration": "0.5%"}),
            json!({"name": "Copper fungicide", "current_quantity": 6.0, "unit": "bottle"}),
            json!({"name": "Calcium nitrate", "current_quantity": 25.0, "unit": "kg"}),
            json!({"name": "Sticky traps", "current_quantity": 40.0, "unit": "pack"}),
            json!({"name": "Seaweed extract", "current_quantity": 2500.0, "unit": "ml"}),
        ];

        let pb = progress_bar(items.len())?;
        pb.set_message("Creating inventory items in parallel");
        let requests = items
            .into_iter()
            .map(|item| ("/api/inventory".to_string(), item))
            .collect();
        let results = self.make_parallel_requests(requests, 3, &pb).await?;
        self.created_objects.inventory_items.extend(results);

        pb.finish_with_message("Inventory stocked!");
        println!(
            "{} Created {} inventory items",
            style("✅").green(),
            self.created_objects.inventory_items.len()
        );
        Ok(())
    }

    /// Sequential on purpose: each call draws down the same stock
    pub async fn record_usage(&mut self) -> SeedResult<()> {
        println!("{} Recording inventory usage...", style("[6/6]").bold().dim());

        let active_greenhouses: Vec<String> = self
            .created_objects
            .growing_cycles
            .iter()
            .filter_map(|cycle| cycle["greenhouse_id"].as_str().map(ToString::to_string))
            .collect();
        if active_greenhouses.is_empty() {
            println!("{} No active greenhouse, skipping usage", style("⚠️").yellow());
            return Ok(());
        }

        let pb = progress_bar(self.created_objects.inventory_items.len())?;
        let mut rng = rand::rng();
        for (index, item) in self.created_objects.inventory_items.iter().enumerate() {
            let item_id = id_of(item)?;
            let greenhouse_id = &active_greenhouses[index % active_greenhouses.len()];
            let quantity = (rng.random::<f64>() * 2.0 + 0.5).round().max(1.0);

            match send(
                &self.config,
                Method::POST,
                &format!("/api/inventory/{item_id}/record_usage"),
                Some(json!({
                    "greenhouse_id": greenhouse_id,
                    "quantity_used": quantity,
                    "purpose_note": "Routine weekly application"
                })),
            )
            .await
            {
                Ok(result) => self.created_objects.usage_records.push(result),
                Err(e) => pb.println(format!("{} Usage not recorded: {e}", style("⚠️").yellow())),
            }
            pb.inc(1);
        }

        pb.finish_with_message("Usage recorded!");
        println!(
            "{} Recorded {} usage entries",
            style("✅").green(),
            self.created_objects.usage_records.len()
        );
        Ok(())
    }

    pub async fn seed_database(&mut self) -> SeedResult<()> {
        println!();
        println!("{}", style("Greenhouse Database Seeder").bold().blue());
        println!("{}", style("Creating realistic greenhouse operations data...").dim());
        println!();

        self.create_greenhouses().await?;
        self.start_plantings().await?;
        self.create_harvests().await?;
        self.create_maintenance().await?;
        self.create_inventory().await?;
        self.record_usage().await?;

        self.display_summary();
        Ok(())
    }

    fn display_summary(&self) {
        println!();
        println!("{}", style("🎉 Database Seeding Complete!").bold().green());
        println!("{}", style("═".repeat(50)).dim());

        let summary_data = vec![
            ("Greenhouses", self.created_objects.greenhouses.len()),
            ("Growing Cycles", self.created_objects.growing_cycles.len()),
            ("Weekly Harvests", self.created_objects.harvests.len()),
            (
                "Maintenance",
                self.created_objects.maintenance_activities.len(),
            ),
            ("Inventory Items", self.created_objects.inventory_items.len()),
            ("Usage Records", self.created_objects.usage_records.len()),
        ];

        for (name, count) in summary_data {
            if count > 0 {
                println!("{:.<20} {}", style(name).cyan(), style(count).bold().green());
            }
        }

        println!();
        println!("{} Next Steps:", style("🎯").cyan());
        println!("  {} Browse the API at {}/api/docs", style("•").dim(), self.config.base_url);
        println!("  {} Advance a cycle to maturation and complete it", style("•").dim());
        println!("  {} Check remaining stock under /api/inventory", style("•").dim());
        println!();
    }
}

#[tokio::main]
async fn main() -> SeedResult<()> {
    let matches = Command::new("Greenhouse Database Seeder")
        .version("1.0")
        .about("Seeds the greenhouse API with demo greenhouses, cycles, harvests and inventory")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("API base URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .value_name("TOKEN")
                .help("Existing API token; skips login")
                .conflicts_with("username"),
        )
        .arg(
            Arg::new("username")
                .long("username")
                .value_name("USERNAME")
                .help("Account to log in with"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .value_name("PASSWORD")
                .help("Password for --username")
                .requires("username"),
        )
        .arg(
            Arg::new("signup")
                .long("signup")
                .action(ArgAction::SetTrue)
                .help("Create the --username account before logging in")
                .requires("password"),
        )
        .get_matches();

    let base_url = matches
        .get_one::<String>("url")
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000".to_string());
    let token = matches.get_one::<String>("token").cloned().unwrap_or_default();

    println!("{}", style("Greenhouse Database Seeder v1.0").bold());
    println!("{}", style("━".repeat(40)).dim());
    println!("API URL: {}", style(&base_url).cyan());

    let mut seeder = DatabaseSeeder::new(&base_url, token)?;

    if let Some(username) = matches.get_one::<String>("username") {
        let password = matches
            .get_one::<String>("password")
            .ok_or("--password is required with --username")?;
        seeder
            .login(username, password, matches.get_flag("signup"))
            .await?;
    }

    seeder.seed_database().await?;

    Ok(())
}
