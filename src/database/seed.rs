use sqlx::SqlitePool;

use super::conference_repo::{self, NewConference};
use super::delegate_repo::{self, NewDelegate};
use super::registration_repo::{self, NewRegistration};

pub(crate) const CONFERENCES: &[NewConference<'static>] = &[
    NewConference {
        id: "conf-1",
        name: "Annual Tech Summit 2023",
        start_date: "2023-11-15",
        end_date: Some("2023-11-18"),
        time_label: Some("09:00 - 18:00"),
        location: "Convention Center, New York",
        capacity: 500,
        registered_count: 342,
        status: "upcoming",
        description: Some(
            "Join us for the biggest tech conference of the year featuring keynotes from industry leaders and hands-on workshops.",
        ),
        price_cents: 49_900,
        tags: Some(r#"["Technology","Innovation","Networking"]"#),
    },
    NewConference {
        id: "conf-2",
        name: "Healthcare Innovation Conference",
        start_date: "2023-12-05",
        end_date: Some("2023-12-07"),
        time_label: Some("10:00 - 16:00"),
        location: "Medical Center, Boston",
        capacity: 300,
        registered_count: 187,
        status: "upcoming",
        description: Some(
            "Exploring the latest advancements in healthcare technology and patient care methodologies.",
        ),
        price_cents: 59_900,
        tags: Some(r#"["Healthcare","Innovation","Research"]"#),
    },
    NewConference {
        id: "conf-3",
        name: "Global Business Forum",
        start_date: "2023-10-20",
        end_date: Some("2023-10-20"),
        time_label: Some("08:30 - 17:00"),
        location: "Business Center, Chicago",
        capacity: 400,
        registered_count: 400,
        status: "completed",
        description: Some(
            "Connect with business leaders from around the world and discover new opportunities for growth and collaboration.",
        ),
        price_cents: 39_900,
        tags: Some(r#"["Business","Networking","Global"]"#),
    },
    NewConference {
        id: "conf-4",
        name: "AI & Machine Learning Summit",
        start_date: "2023-12-15",
        end_date: Some("2023-12-15"),
        time_label: Some("09:30 - 17:30"),
        location: "Tech Hub, San Francisco",
        capacity: 350,
        registered_count: 210,
        status: "upcoming",
        description: Some(
            "Dive deep into the world of artificial intelligence and machine learning with expert-led sessions and networking opportunities.",
        ),
        price_cents: 64_900,
        tags: Some(r#"["AI","Machine Learning","Technology"]"#),
    },
    NewConference {
        id: "conf-5",
        name: "Sustainable Development Conference",
        start_date: "2024-01-10",
        end_date: Some("2024-01-10"),
        time_label: Some("10:00 - 16:00"),
        location: "Green Center, Portland",
        capacity: 250,
        registered_count: 98,
        status: "upcoming",
        description: Some(
            "Join thought leaders and practitioners in discussing sustainable development goals and environmental conservation strategies.",
        ),
        price_cents: 34_900,
        tags: Some(r#"["Sustainability","Environment","Development"]"#),
    },
];

pub(crate) const DELEGATES: &[NewDelegate<'static>] = &[
    NewDelegate {
        id: "1",
        name: "John Smith",
        email: "john.smith@example.com",
        phone: "+1 (555) 123-4567",
        organization: Some("Acme Inc."),
        status: "active",
        badge_id: "DEL-1001",
        conference_id: Some("conf-1"),
        check_in_status: "not-checked-in",
        check_in_time: None,
    },
    NewDelegate {
        id: "2",
        name: "Sarah Johnson",
        email: "sarah.johnson@example.com",
        phone: "+1 (555) 987-6543",
        organization: Some("Globex Corp"),
        status: "active",
        badge_id: "DEL-1002",
        conference_id: Some("conf-1"),
        check_in_status: "checked-in",
        check_in_time: Some("Today, 9:45 AM"),
    },
    NewDelegate {
        id: "3",
        name: "Michael Brown",
        email: "michael.brown@example.com",
        phone: "+1 (555) 456-7890",
        organization: Some("Initech"),
        status: "active",
        badge_id: "DEL-1003",
        conference_id: Some("conf-1"),
        check_in_status: "not-checked-in",
        check_in_time: None,
    },
    NewDelegate {
        id: "4",
        name: "Emily Davis",
        email: "emily.davis@example.com",
        phone: "+1 (555) 234-5678",
        organization: Some("Umbrella Corp"),
        status: "pending",
        badge_id: "DEL-1004",
        conference_id: Some("conf-2"),
        check_in_status: "not-checked-in",
        check_in_time: None,
    },
    NewDelegate {
        id: "5",
        name: "David Wilson",
        email: "david.wilson@example.com",
        phone: "+1 (555) 876-5432",
        organization: Some("Stark Industries"),
        status: "inactive",
        badge_id: "DEL-1005",
        conference_id: Some("conf-2"),
        check_in_status: "checked-in",
        check_in_time: Some("Today, 8:30 AM"),
    },
];

pub(crate) const REGISTRATIONS: &[NewRegistration<'static>] = &[
    NewRegistration {
        id: "1",
        delegate_id: "1",
        conference_id: "conf-1",
        registration_date: "2023-05-15",
        status: "approved",
        payment_status: "paid",
        ticket_type: "VIP",
        amount_cents: 29_999,
        payment_method: Some("credit_card"),
    },
    NewRegistration {
        id: "2",
        delegate_id: "2",
        conference_id: "conf-1",
        registration_date: "2023-05-16",
        status: "pending",
        payment_status: "unpaid",
        ticket_type: "Standard",
        amount_cents: 14_999,
        payment_method: Some("invoice"),
    },
    NewRegistration {
        id: "3",
        delegate_id: "3",
        conference_id: "conf-4",
        registration_date: "2023-06-01",
        status: "approved",
        payment_status: "paid",
        ticket_type: "Early Bird",
        amount_cents: 9_999,
        payment_method: Some("credit_card"),
    },
    NewRegistration {
        id: "4",
        delegate_id: "4",
        conference_id: "conf-2",
        registration_date: "2023-06-10",
        status: "rejected",
        payment_status: "refunded",
        ticket_type: "Standard",
        amount_cents: 59_900,
        payment_method: Some("bank_transfer"),
    },
    NewRegistration {
        id: "5",
        delegate_id: "5",
        conference_id: "conf-2",
        registration_date: "2023-06-12",
        status: "cancelled",
        payment_status: "refunded",
        ticket_type: "Standard",
        amount_cents: 59_900,
        payment_method: Some("invoice"),
    },
];

pub async fn seed_sample_data(pool: &SqlitePool) -> sqlx::Result<()> {
    for row in CONFERENCES {
        conference_repo::insert_conference(pool, *row).await?;
    }
    for row in DELEGATES {
        delegate_repo::insert_delegate(pool, *row).await?;
    }
    for row in REGISTRATIONS {
        registration_repo::insert_registration(pool, *row).await?;
    }
    Ok(())
}
