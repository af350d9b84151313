// src/store.rs

//! In-memory record supply for users, appointments and prescriptions.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Prescription, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("email already registered")]
    EmailTaken,
}

/// Every record accessor is scoped to its owner: another user's record reads
/// as `NotFound`.
#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Option<User>;
    async fn get_user(&self, user_id: Uuid) -> Result<User, StoreError>;

    async fn list_appointments(&self, user_id: Uuid) -> Vec<Appointment>;
    async fn get_appointment(&self, user_id: Uuid, id: Uuid) -> Result<Appointment, StoreError>;
    async fn insert_appointment(&self, appointment: Appointment) -> Appointment;
    async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError>;
    async fn delete_appointment(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    async fn list_prescriptions(&self, user_id: Uuid) -> Vec<Prescription>;
    async fn get_prescription(&self, user_id: Uuid, id: Uuid) -> Result<Prescription, StoreError>;
    async fn insert_prescription(&self, prescription: Prescription) -> Prescription;
    async fn replace_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError>;
    async fn delete_prescription(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;

    /// Loads the demo appointments and prescriptions for a fresh account.
    async fn seed_demo_records(&self, user_id: Uuid, now: DateTime<Utc>) {
        for appointment in demo_appointments(user_id, now) {
            self.insert_appointment(appointment).await;
        }
        for prescription in demo_prescriptions(user_id, now) {
            self.insert_prescription(prescription).await;
        }
        tracing::info!("seeded demo records for user {user_id}");
    }
}

#[derive(Default)]
pub struct MemoryStore {
    latency: Duration,
    users: RwLock<HashMap<Uuid, User>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    prescriptions: RwLock<HashMap<Uuid, Prescription>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl MemoryStore {
    pub fn new(latency: Duration) -> Self {
        MemoryStore {
            latency,
            ..Default::default()
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tracing::debug!("simulated store latency: {:?}", self.latency);
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PortalStore for MemoryStore {
    async fn insert_user(&self, mut user: User) -> Result<User, StoreError> {
        self.simulate_latency().await;
        user.email = normalize_email(&user.email);

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.simulate_latency().await;
        let email = normalize_email(email);
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User, StoreError> {
        self.simulate_latency().await;
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    async fn list_appointments(&self, user_id: Uuid) -> Vec<Appointment> {
        self.simulate_latency().await;
        let mut rows: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.appointment_date);
        rows
    }

    async fn get_appointment(&self, user_id: Uuid, id: Uuid) -> Result<Appointment, StoreError> {
        self.simulate_latency().await;
        self.appointments
            .read()
            .await
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound("appointment"))
    }

    async fn insert_appointment(&self, appointment: Appointment) -> Appointment {
        self.simulate_latency().await;
        self.appointments
            .write()
            .await
            .insert(appointment.appointment_id, appointment.clone());
        appointment
    }

    async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        self.simulate_latency().await;
        let mut rows = self.appointments.write().await;
        match rows.get_mut(&appointment.appointment_id) {
            Some(existing) if existing.user_id == appointment.user_id => {
                *existing = appointment.clone();
                Ok(appointment)
            }
            _ => Err(StoreError::NotFound("appointment")),
        }
    }

    async fn delete_appointment(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let mut rows = self.appointments.write().await;
        match rows.get(&id) {
            Some(a) if a.user_id == user_id => {
                rows.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound("appointment")),
        }
    }

    async fn list_prescriptions(&self, user_id: Uuid) -> Vec<Prescription> {
        self.simulate_latency().await;
        let mut rows: Vec<Prescription> = self
            .prescriptions
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.end_date
                .cmp(&b.end_date)
                .then_with(|| a.medicine_name.cmp(&b.medicine_name))
        });
        rows
    }

    async fn get_prescription(&self, user_id: Uuid, id: Uuid) -> Result<Prescription, StoreError> {
        self.simulate_latency().await;
        self.prescriptions
            .read()
            .await
            .get(&id)
            .filter(|p| p.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound("prescription"))
    }

    async fn insert_prescription(&self, prescription: Prescription) -> Prescription {
        self.simulate_latency().await;
        self.prescriptions
            .write()
            .await
            .insert(prescription.prescription_id, prescription.clone());
        prescription
    }

    async fn replace_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError> {
        self.simulate_latency().await;
        let mut rows = self.prescriptions.write().await;
        match rows.get_mut(&prescription.prescription_id) {
            Some(existing) if existing.user_id == prescription.user_id => {
                *existing = prescription.clone();
                Ok(prescription)
            }
            _ => Err(StoreError::NotFound("prescription")),
        }
    }

    async fn delete_prescription(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let mut rows = self.prescriptions.write().await;
        match rows.get(&id) {
            Some(p) if p.user_id == user_id => {
                rows.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound("prescription")),
        }
    }
}

/* -------------------------
   Demo fixtures
--------------------------*/

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    ymd(y, m, d).and_hms_opt(h, min, 0).unwrap_or_default()
}

fn demo_appointments(user_id: Uuid, now: DateTime<Utc>) -> Vec<Appointment> {
    let rows = [
        ("Dr. Sarah Johnson", at(2024, 1, 15, 10, 0), "Regular Checkup", Some("Annual physical examination"), AppointmentStatus::Scheduled),
        ("Dr. Michael Chen", at(2024, 1, 18, 14, 30), "Follow-up", Some("Blood pressure monitoring"), AppointmentStatus::Scheduled),
        ("Dr. Emily Rodriguez", at(2024, 1, 10, 9, 0), "Consultation", Some("Skin condition review"), AppointmentStatus::Completed),
        ("Dr. James Wilson", at(2024, 1, 12, 11, 15), "Lab Results", None, AppointmentStatus::Cancelled),
    ];

    rows.into_iter()
        .map(|(doctor, date, reason, notes, status)| Appointment {
            appointment_id: Uuid::new_v4(),
            user_id,
            doctor_name: doctor.to_string(),
            appointment_date: date,
            reason: reason.to_string(),
            notes: notes.map(str::to_string),
            status,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

fn demo_prescriptions(user_id: Uuid, now: DateTime<Utc>) -> Vec<Prescription> {
    let rows = [
        ("Lisinopril", "10mg", "Once daily", ymd(2024, 1, 1), ymd(2024, 2, 1), "Dr. Sarah Johnson", Some("Take with food in the morning")),
        ("Metformin", "500mg", "Twice daily", ymd(2024, 1, 1), ymd(2024, 3, 1), "Dr. Michael Chen", Some("Take with meals")),
        ("Amoxicillin", "250mg", "Three times daily", ymd(2023, 12, 15), ymd(2024, 1, 15), "Dr. Emily Rodriguez", Some("Complete the full course")),
        ("Vitamin D3", "1000 IU", "Once daily", ymd(2024, 1, 1), ymd(2024, 6, 1), "Dr. Sarah Johnson", None),
    ];

    rows.into_iter()
        .map(|(name, dosage, frequency, start, end, doctor, instructions)| Prescription {
            prescription_id: Uuid::new_v4(),
            user_id,
            medicine_name: name.to_string(),
            dosage: dosage.to_string(),
            frequency: frequency.to_string(),
            start_date: start,
            end_date: end,
            doctor_name: doctor.to_string(),
            instructions: instructions.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
        .collect()
}
