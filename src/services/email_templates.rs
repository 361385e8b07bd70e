//! Plantillas de correo
//!
//! HTML de las notificaciones de estado, confirmación de viaje,
//! bienvenida y reseteo de contraseña.

use chrono::Datelike;

use crate::{
    models::{
        travel::{Travel, TravelStatus},
        user::{Account, User},
    },
    services::email_service::EmailMessage,
};

/// Envoltorio común de todas las notificaciones
fn layout(header: &str, body: &str) -> String {
    format!(
        r#"<html>
  <body style="margin: 0; padding: 0; background: #f4f6f8; font-family: 'Segoe UI', Tahoma, sans-serif; color: #374151;">
    <div style="max-width: 600px; margin: 30px auto; background: #ffffff; border-radius: 12px; padding: 30px;">
      <div style="text-align: center; color: #0ea5e9; font-size: 20px; font-weight: bold; margin-bottom: 20px;">{header}</div>
      {body}
      <div style="margin-top: 30px; font-size: 13px; color: #9ca3af; text-align: center;">
        <p>Powered by EduMove</p>
        <p>&copy; {year} EduMove. All rights reserved.</p>
      </div>
    </div>
  </body>
</html>"#,
        header = header,
        body = body,
        year = chrono::Utc::now().year(),
    )
}

fn trip_footer(travel: &Travel) -> String {
    format!(
        r#"<p style="font-size: 14px;">Trip ID: <strong>{}</strong></p>"#,
        travel.travel_number
    )
}

fn arrival_time(travel: &Travel) -> String {
    travel
        .travel_details
        .expected_arrival_time
        .format("%Y-%m-%d %H:%M UTC")
        .to_string()
}

/// Aviso al tutor; `None` para estados sin plantilla
pub fn guardian_status_email(travel: &Travel) -> Option<EmailMessage> {
    let details = &travel.travel_details;
    let guardian = &travel.guardian;
    let student = &travel.student.name;
    let transporter = &details.transporter.name;

    let body = match travel.status {
        TravelStatus::Boarded => format!(
            r#"<p>Hello <strong>{}</strong>,</p>
<p>We wanted to let you know that <strong>{}</strong> has <span style="color: #0ea5e9; font-weight: bold;">boarded the bus</span>.</p>
<p><strong>Departure:</strong> {}<br/><strong>Destination:</strong> {}<br/><strong>Departure Time:</strong> {}<br/><strong>Expected Arrival:</strong> {}</p>
<p><strong>Transporter:</strong> {}</p>"#,
            guardian.name,
            student,
            details.departure,
            details.destination,
            details.departure_time,
            arrival_time(travel),
            transporter
        ),
        TravelStatus::ArrivedAtDestination => format!(
            r#"<p>Hello <strong>{}</strong>,</p>
<p><strong>{}</strong> has <span style="color: green; font-weight: bold;">safely arrived at the destination</span>.</p>
<p><strong>Destination:</strong> {}<br/><strong>Transporter:</strong> {}</p>"#,
            guardian.name, student, details.destination, transporter
        ),
        TravelStatus::ArrivedAtSchool => format!(
            r#"<p>Hello <strong>{}</strong>,</p>
<p><strong>{}</strong> has <span style="color: green; font-weight: bold;">safely arrived at school</span>.</p>
<p><strong>From:</strong> {}<br/><strong>Transporter:</strong> {}</p>"#,
            guardian.name, student, details.departure, transporter
        ),
        TravelStatus::Cancelled => format!(
            r#"<p>Hello <strong>{}</strong>,</p>
<p>We regret to inform you that <strong>{}</strong>'s trip has been <span style="color: red; font-weight: bold;">cancelled</span>.</p>
<p>If you have questions, please contact your assigned transporter <strong>{}</strong>.</p>"#,
            guardian.name, student, transporter
        ),
        TravelStatus::Pending | TravelStatus::LeftSchool => return None,
    };

    Some(EmailMessage {
        to: vec![guardian.email.clone()],
        subject: format!("EduMove Update: {}'s Status - {}", student, travel.status),
        html: layout(
            "EduMove Travel Update",
            &format!("{}\n{}", body, trip_footer(travel)),
        ),
    })
}

/// Aviso a la escuela; `None` para estados sin plantilla
pub fn school_status_email(travel: &Travel, school_email: &str) -> Option<EmailMessage> {
    let details = &travel.travel_details;
    let student = &travel.student.name;
    let transporter = &details.transporter.name;

    let body = match travel.status {
        TravelStatus::Boarded => format!(
            r#"<p>Dear School Administrator,</p>
<p>This is to inform you that <strong>{}</strong> has <span style="color: #0ea5e9; font-weight: bold;">boarded the school bus</span>.</p>
<p><strong>From:</strong> {}<br/><strong>To:</strong> {}<br/><strong>Departure Time:</strong> {}<br/><strong>Expected Arrival:</strong> {}</p>
<p><strong>Transporter:</strong> {}</p>"#,
            student,
            details.departure,
            details.destination,
            details.departure_time,
            arrival_time(travel),
            transporter
        ),
        TravelStatus::ArrivedAtDestination => format!(
            r#"<p>Dear School Administrator,</p>
<p><strong>{}</strong> has <span style="color: green; font-weight: bold;">arrived at the destination</span> as planned.</p>
<p><strong>Destination:</strong> {}<br/><strong>Transporter:</strong> {}</p>"#,
            student, details.destination, transporter
        ),
        TravelStatus::ArrivedAtSchool => format!(
            r#"<p>Dear School Administrator,</p>
<p><strong>{}</strong> has <span style="color: green; font-weight: bold;">safely arrived at the school</span>.</p>
<p><strong>Origin:</strong> {}<br/><strong>Transporter:</strong> {}</p>"#,
            student, details.departure, transporter
        ),
        TravelStatus::Cancelled => format!(
            r#"<p>Dear School Administrator,</p>
<p>The planned trip for <strong>{}</strong> has been <span style="color: red; font-weight: bold;">cancelled</span>.</p>
<p>For inquiries, contact the transporter: <strong>{}</strong>.</p>"#,
            student, transporter
        ),
        TravelStatus::Pending | TravelStatus::LeftSchool => return None,
    };

    Some(EmailMessage {
        to: vec![school_email.to_string()],
        subject: format!(
            "EduMove Notification: {}'s Status - {}",
            student, travel.status
        ),
        html: layout(
            "Student Travel Notification",
            &format!("{}\n{}", body, trip_footer(travel)),
        ),
    })
}

/// Confirmación de reserva para el tutor
pub fn travel_created_email(travel: &Travel) -> EmailMessage {
    let details = &travel.travel_details;
    let payment_ref = travel.payment_reference().unwrap_or("-");

    let body = format!(
        r#"<p>Dear <strong>{guardian}</strong>,</p>
<p>Your travel for <strong>{student}</strong> has been successfully created and confirmed.</p>
<table style="width: 100%; margin-top: 20px;">
  <tr><td><strong>Travel Number:</strong></td><td>{number}</td></tr>
  <tr><td><strong>Departure:</strong></td><td>{departure}</td></tr>
  <tr><td><strong>Destination:</strong></td><td>{destination}</td></tr>
  <tr><td><strong>Departure Time:</strong></td><td>{departure_time}</td></tr>
  <tr><td><strong>Expected Arrival:</strong></td><td>{arrival}</td></tr>
  <tr><td><strong>Transporter:</strong></td><td>{transporter}</td></tr>
  <tr><td><strong>Price:</strong></td><td>RWF {price}</td></tr>
  <tr><td><strong>Payment Ref:</strong></td><td>{payment_ref}</td></tr>
</table>
<p style="margin-top: 30px;">Thank you for using <strong>EduMove</strong>.</p>"#,
        guardian = travel.guardian.name,
        student = travel.student.name,
        number = travel.travel_number,
        departure = details.departure,
        destination = details.destination,
        departure_time = details.departure_time,
        arrival = arrival_time(travel),
        transporter = details.transporter.name,
        price = details.price,
        payment_ref = payment_ref,
    );

    EmailMessage {
        to: vec![travel.guardian.email.clone()],
        subject: format!(
            "{}'s Travel Confirmed - Ticket #{}",
            travel.student.name, travel.travel_number
        ),
        html: layout("Travel Confirmation", &body),
    }
}

/// Bienvenida según la variante de la cuenta
pub fn welcome_email(user: &User, password: &str) -> Option<EmailMessage> {
    let intro = match &user.account {
        Account::Transporter { area_of_operations } => format!(
            "Your transporter account is ready. You can now publish schedules for your routes ({}) and confirm boarding for your passengers.",
            area_of_operations.join(", ")
        ),
        Account::School {
            district, sector, ..
        } => format!(
            "Your school account for {} / {} is ready. You will be notified about your students' trips and can confirm their arrival at school.",
            district, sector
        ),
        Account::User | Account::Admin | Account::Authority => return None,
    };

    let body = format!(
        r#"<p>Hello <strong>{}</strong>,</p>
<p>{}</p>
<p><strong>Email:</strong> {}<br/><strong>Temporary password:</strong> {}</p>
<p>Please sign in and change your password.</p>"#,
        user.name, intro, user.email, password
    );

    Some(EmailMessage {
        to: vec![user.email.clone()],
        subject: "Welcome to EduMove".to_string(),
        html: layout("Welcome to EduMove", &body),
    })
}

pub fn password_reset_email(user: &User, code: &str, valid_minutes: i64) -> EmailMessage {
    let body = format!(
        r#"<p>Hello <strong>{}</strong>,</p>
<p>Use the code below to reset your password. It expires in {} minutes.</p>
<p style="font-size: 28px; letter-spacing: 6px; text-align: center;"><strong>{}</strong></p>
<p style="font-size: 14px;">If you didn't request this email, you can safely ignore it.</p>"#,
        user.name, valid_minutes, code
    );

    EmailMessage {
        to: vec![user.email.clone()],
        subject: "Your EduMove password reset code".to_string(),
        html: layout("Password Reset", &body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::travel::tests_support::sample_travel;

    #[test]
    fn test_guardian_templates_cover_notified_statuses() {
        let mut travel = sample_travel();
        for status in [
            TravelStatus::Boarded,
            TravelStatus::ArrivedAtDestination,
            TravelStatus::ArrivedAtSchool,
            TravelStatus::Cancelled,
        ] {
            travel.status = status;
            let email = guardian_status_email(&travel).unwrap();
            assert_eq!(email.to, vec!["jane@example.com".to_string()]);
            assert!(email.subject.contains(status.as_str()));
            assert!(email.html.contains(&travel.travel_number));
        }

        travel.status = TravelStatus::Pending;
        assert!(guardian_status_email(&travel).is_none());
    }

    #[test]
    fn test_creation_email_includes_price_and_reference() {
        let travel = sample_travel();
        let email = travel_created_email(&travel);
        assert!(email.html.contains("RWF 5000"));
        assert!(email.subject.contains("TR-123456-42"));
    }

    #[test]
    fn test_welcome_depends_on_account_variant() {
        let school = User::new(
            "Green Hills".into(),
            "school@example.com".into(),
            "+250780000001".into(),
            "hash".into(),
            Account::School {
                district: "Gasabo".into(),
                sector: "Remera".into(),
                cell: "Rukiri".into(),
                village: "Amahoro".into(),
            },
        );
        let email = welcome_email(&school, "secret").unwrap();
        assert!(email.html.contains("Gasabo"));

        let admin = User::new(
            "Root".into(),
            "root@example.com".into(),
            "+250780000002".into(),
            "hash".into(),
            Account::Admin,
        );
        assert!(welcome_email(&admin, "secret").is_none());
    }
}
