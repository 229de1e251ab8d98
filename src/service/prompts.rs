// service/prompts.rs
use crate::models::jobmodel::BidView;
use crate::models::profilemodel::{ConversationStage, Profile, Role};
use crate::utils::area::area_menu;

pub fn welcome() -> String {
    "ברוכים הבאים ל-CleanMatch! 🧹\nלא זיהיתי את המספר שלך.\nהאם תרצה/י להירשם כ*לקוח* (1) או כ*מנקה* (2)?"
        .to_string()
}

pub fn greeting(profile: &Profile) -> String {
    format!(
        "שלום {}, איזה כיף לראות אותך שוב!\n{}",
        profile.display_name(),
        main_menu(profile.role)
    )
}

pub fn main_menu(role: Role) -> String {
    match role {
        Role::Client => {
            "לשליחת בקשה לניקיון כתבו *הזמנה*.\nלביטול בקשה שטרם נשלחה כתבו *ביטול*.".to_string()
        }
        Role::Provider => {
            "כשתגיע אליך הצעת עבודה, השב/י במחיר המבוקש (מספר בלבד).\nבסיום עבודה שאושרה כתבו *בוצע*."
                .to_string()
        }
    }
}

/// The prompt that asks for the field collected at `stage`.
pub fn stage_prompt(stage: ConversationStage, role: Role) -> String {
    match stage {
        ConversationStage::AwaitingName => "מה השם המלא שלך?".to_string(),
        ConversationStage::AwaitingArea => match role {
            Role::Client => format!("באיזו עיר את/ה גר/ה? בחר/י מספר או שם:\n{}", area_menu()),
            Role::Provider => format!(
                "באילו ערים את/ה עובד/ת? שלח/י עיר אחת בכל הודעה (מספר או שם).\nבסיום כתבו *סיום*.\n{}",
                area_menu()
            ),
        },
        ConversationStage::AwaitingRate => "מה התעריף השעתי שלך בש\"ח? (מספר בלבד)".to_string(),
        ConversationStage::AwaitingFee => "מה דמי הנסיעה שלך בש\"ח? (מספר בלבד, 0 אם אין)".to_string(),
        ConversationStage::AwaitingBio => "ספר/י בקצרה על עצמך ועל הניסיון שלך.".to_string(),
        ConversationStage::Ready => main_menu(role),
        ConversationStage::BookingDate => {
            "לאיזה תאריך? (למשל 25/10 או 25/10/2026)".to_string()
        }
        ConversationStage::BookingTime => "באיזו שעה? (בפורמט HH:MM, למשל 09:30)".to_string(),
        ConversationStage::AwaitingSelection => "בחר/י את מספר ההצעה המועדפת.".to_string(),
        ConversationStage::AwaitingRating => "איך היה? דרג/י את השירות מ-1 עד 5.".to_string(),
    }
}

pub fn area_added(area: &str) -> String {
    format!("✅ {} נוספה. שלח/י עיר נוספת או כתבו *סיום*.", area)
}

pub fn areas_required() -> String {
    "יש לבחור לפחות עיר אחת לפני סיום.".to_string()
}

pub fn registration_complete(role: Role) -> String {
    format!("🎉 ההרשמה הושלמה!\n{}", main_menu(role))
}

pub fn invalid_input() -> String {
    "לא הצלחתי להבין. ננסה שוב:".to_string()
}

pub fn booking_started(area: &str) -> String {
    format!("מעולה! בקשה חדשה באזור {}.", area)
}

pub fn active_job_exists() -> String {
    "כבר יש לך בקשה פעילה. נעדכן אותך ברגע שיהיו הצעות.".to_string()
}

pub fn draft_cancelled() -> String {
    "הבקשה בוטלה.".to_string()
}

pub fn nothing_to_cancel() -> String {
    "אין בקשה בהכנה לביטול. בקשה שכבר נשלחה למנקים אינה ניתנת לביטול כאן.".to_string()
}

pub fn request_received(providers_notified: usize) -> String {
    format!(
        "✅ הבקשה התקבלה ונשלחה ל-{} מנקים באזור. נעדכן אותך כשיגיעו הצעות.",
        providers_notified
    )
}

pub fn no_providers_in_area(area: &str) -> String {
    format!(
        "הבקשה התקבלה, אך כרגע אין מנקים רשומים באזור {}. הבקשה תישאר פתוחה.",
        area
    )
}

pub fn job_offer(area: &str, date: &str, time: &str) -> String {
    format!(
        "🧹 עבודה חדשה!\nאזור: {}\nתאריך: {}\nשעה: {}\nלהגשת הצעה השב/י במחיר (מספר בלבד).",
        area, date, time
    )
}

pub fn bid_received(price: &str) -> String {
    format!("✅ הצעתך על סך ₪{} התקבלה. נעדכן אם תיבחר/י.", price)
}

pub fn bid_invalid() -> String {
    "המחיר צריך להיות מספר חיובי, למשל 250.".to_string()
}

pub fn bid_duplicate() -> String {
    "כבר הגשת הצעה לעבודה זו.".to_string()
}

pub fn auction_closed() -> String {
    "מצטערים, ההרשמה לעבודה זו כבר נסגרה.".to_string()
}

pub fn no_active_offer() -> String {
    "אין כרגע הצעת עבודה פתוחה עבורך.".to_string()
}

pub fn bid_list(bids: &[BidView]) -> String {
    let lines = bids
        .iter()
        .enumerate()
        .map(|(i, bid)| {
            let name = bid.provider_name.as_deref().unwrap_or("מנקה");
            match bid.provider_bio.as_deref() {
                Some(bio) if !bio.is_empty() => {
                    format!("{}. {} - ₪{}\n   {}", i + 1, name, bid.price, bio)
                }
                _ => format!("{}. {} - ₪{}", i + 1, name, bid.price),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "התקבלו {} הצעות:\n{}\nהשב/י במספר ההצעה שבחרת (1-{}).",
        bids.len(),
        lines,
        bids.len()
    )
}

pub fn selection_out_of_range(count: usize) -> String {
    format!("יש לבחור מספר בין 1 ל-{}.", count)
}

pub fn job_cancelled_no_bids() -> String {
    "לצערנו לא התקבלו הצעות לבקשה שלך והיא בוטלה. אפשר לנסות שוב בכל עת עם *הזמנה*.".to_string()
}

pub fn winner_contact_for_client(provider_name: &str, provider_phone: &str, price: &str) -> String {
    format!(
        "🎉 העבודה אושרה!\nהמנקה: {}\nטלפון: {}\nמחיר: ₪{}",
        provider_name, provider_phone, price
    )
}

pub fn winner_contact_for_provider(
    client_name: &str,
    client_phone: &str,
    area: &str,
    date: &str,
    time: &str,
) -> String {
    format!(
        "🎉 זכית בעבודה!\nלקוח: {}\nטלפון: {}\nאזור: {}\nתאריך: {} בשעה {}\nבסיום העבודה כתבו *בוצע*.",
        client_name, client_phone, area, date, time
    )
}

pub fn not_selected() -> String {
    "הלקוח בחר בהצעה אחרת הפעם. תודה על ההשתתפות!".to_string()
}

pub fn completion_acknowledged() -> String {
    "תודה! העבודה סומנה כהושלמה.".to_string()
}

pub fn no_confirmed_job() -> String {
    "לא נמצאה עבודה מאושרת שלך לסימון כהושלמה.".to_string()
}

pub fn rating_request() -> String {
    "העבודה הסתיימה! איך היה? דרג/י את השירות מ-1 עד 5.".to_string()
}

pub fn rating_thanks() -> String {
    "תודה על הדירוג! 🙏".to_string()
}

pub fn system_error() -> String {
    "מצטער, חלה שגיאה במערכת. אנא שלח/י את ההודעה שוב.".to_string()
}
