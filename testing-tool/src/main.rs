use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use remisage::client::{normalize_vehicle_list, LocationQuota, NormalizedVehicle};
use remisage::dto::vehicle_dto::LocationHistoryResponse;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<()> {
    println!("{}", "🚗 Remisage Testing Tool".bright_blue().bold());
    println!("{}", "=====================================".bright_blue());
    println!();

    let base_url = prompt("URL del servidor [http://localhost:3000]: ")?;
    let base_url = if base_url.is_empty() {
        "http://localhost:3000".to_string()
    } else {
        base_url.trim_end_matches('/').to_string()
    };

    let mut session = Session {
        client: Client::new(),
        base_url,
        token: None,
        user_id: None,
    };

    // Paso 1: Autenticarse y obtener token
    session.login().await?;

    // Paso 2: Menú principal
    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🩺 Health check");
        println!("2. 🚗 Listar vehículos (normalizados)");
        println!("3. 📍 Actualizar ubicación de un vehículo");
        println!("4. 🕓 Historial y cupo de cambios de ubicación");
        println!("5. 🔔 Notificaciones no leídas");
        println!("6. 🚪 Salir");
        let choice = prompt("Selecciona una opción (1-6): ")?;

        let result = match choice.as_str() {
            "1" => session.health().await,
            "2" => session.list_vehicles().await.map(|_| ()),
            "3" => session.update_location().await,
            "4" => session.location_quota().await,
            "5" => session.unread_notifications().await,
            "6" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
                continue;
            }
        };

        if let Err(e) = result {
            println!("{}", format!("❌ {:#}", e).bright_red());
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label.bright_yellow());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

struct Session {
    client: Client,
    base_url: String,
    token: Option<String>,
    user_id: Option<i64>,
}

impl Session {
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        println!("{}", format!("📤 {} {}", method, url).bright_blue());
        let response = request.send().await.with_context(|| format!("Error llamando a {}", url))?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            bail!("{} → {}\n{}", path, status, serde_json::to_string_pretty(&value)?);
        }
        Ok(value)
    }

    async fn login(&mut self) -> Result<()> {
        println!("{}", "🔐 CREDENCIALES".bright_cyan().bold());
        println!("{}", "===============".bright_cyan());
        let email = prompt("Email: ")?;
        let password = prompt("Password: ")?;

        let response = self
            .call(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "email": email, "password": password })),
            )
            .await?;

        let data = response.get("data").ok_or_else(|| anyhow!("Respuesta sin 'data'"))?;
        let token = data
            .get("token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("No se pudo extraer el token de la respuesta"))?;
        self.token = Some(token.to_string());
        self.user_id = data.get("user").and_then(|u| u.get("id")).and_then(|v| v.as_i64());

        let role = data
            .get("user")
            .and_then(|u| u.get("role"))
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        println!("{}", format!("✅ Sesión iniciada ({})", role).bright_green().bold());
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let response = self.call(Method::GET, "/api/health", None).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }

    async fn list_vehicles(&self) -> Result<Vec<NormalizedVehicle>> {
        let response = self.call(Method::GET, "/api/vehicles", None).await?;
        let vehicles = normalize_vehicle_list(&response);

        println!(
            "{}",
            format!("🚗 VEHÍCULOS ENCONTRADOS: {} elementos", vehicles.len()).bright_green().bold()
        );
        for vehicle in &vehicles {
            let assigned = vehicle
                .assigned_to
                .map(|id| format!("usuario {}", id))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  #{:<15} {:<12} {:<20} {:<12} {}",
                vehicle.id, vehicle.license_plate, vehicle.model, vehicle.status, assigned
            );
        }

        // assigned ⇔ assignedTo presente
        let inconsistent: Vec<i64> = vehicles
            .iter()
            .filter(|v| (v.status == "assigned") != v.assigned_to.is_some())
            .map(|v| v.id)
            .collect();
        if inconsistent.is_empty() {
            println!("{}", "✅ Estado y asignación coherentes".bright_green());
        } else {
            println!(
                "{}",
                format!("⚠️ Estado/asignación incoherentes: {:?}", inconsistent).bright_red()
            );
        }
        Ok(vehicles)
    }

    async fn update_location(&self) -> Result<()> {
        let vehicle_id = prompt("ID del vehículo: ")?;
        let address = prompt("Dirección: ")?;
        let latitude: f64 = prompt("Latitud: ")?.parse().context("Latitud inválida")?;
        let longitude: f64 = prompt("Longitud: ")?.parse().context("Longitud inválida")?;

        let response = self
            .call(
                Method::PUT,
                &format!("/api/vehicles/{}/location", vehicle_id),
                Some(json!({ "address": address, "latitude": latitude, "longitude": longitude })),
            )
            .await?;
        println!("{}", "✅ Ubicación actualizada".bright_green().bold());
        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }

    async fn location_quota(&self) -> Result<()> {
        let vehicle_id = prompt("ID del vehículo: ")?;
        let response = self
            .call(Method::GET, &format!("/api/vehicles/{}/location-history", vehicle_id), None)
            .await?;

        let entries: Vec<LocationHistoryResponse> =
            serde_json::from_value(response.get("data").cloned().unwrap_or(Value::Array(vec![])))?;
        println!("{}", format!("🕓 {} entradas", entries.len()).bright_green().bold());
        for entry in entries.iter().take(10) {
            println!(
                "  {} {} ({}, {}) por {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.address,
                entry.latitude,
                entry.longitude,
                entry.updated_by
            );
        }

        if let Some(user_id) = self.user_id {
            let quota = LocationQuota::default().status(&entries, user_id, chrono::Utc::now());
            let line = format!(
                "📊 Cambios este mes: {}/{} (restantes: {})",
                quota.used, quota.max_per_month, quota.remaining
            );
            if quota.exhausted() {
                println!("{}", line.bright_red());
            } else {
                println!("{}", line.bright_cyan());
            }
        }
        Ok(())
    }

    async fn unread_notifications(&self) -> Result<()> {
        let count = self.call(Method::GET, "/api/notifications/unread/count", None).await?;
        let unread = count
            .get("data")
            .and_then(|d| d.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        println!("{}", format!("🔔 {} notificaciones sin leer", unread).bright_green().bold());

        if unread > 0 {
            let list = self
                .call(Method::GET, "/api/notifications?unreadOnly=true", None)
                .await?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        Ok(())
    }
}
