use chrono::DateTime;
use chrono::Utc;
use reqwest;
use serde::{Deserialize, Serialize};

pub const ORACLE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

pub async fn generate_oracle_prompt(
    prompt: &str,
    prompt_type: &str,
    api_key: &str,
    timezone: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let now: DateTime<Utc> = Utc::now();

    let full_prompt = match prompt_type {
        "intent" => format!(
            "You are an intent classifier for a calendar assistant.\n\
             Current date and time (UTC): {now}\n\
             User timezone: {timezone}\n\
             Task: Classify the user's message into exactly one of these labels:\n\
             - meeting_summary: asking to summarize meetings or how time was spent over some period\n\
             - create_event: asking to create, schedule, book, or block time for a calendar event\n\
             - datetime_query: asking about dates, times, availability, or what is on the calendar\n\
             - confirmation: answering a question the assistant asked (yes, no, that works, another time)\n\
             Rules:\n\
             - Reply with ONLY the label, lowercase, no punctuation, no prose, no JSON.\n\
             User message: \"{user_prompt}\"",
            now = now.to_rfc3339(),
            timezone = timezone,
            user_prompt = prompt
        ),
        "response" => format!(
            "You are a yes/no response classifier for a calendar assistant.\n\
             The assistant just proposed an event time and asked the user to confirm it.\n\
             Task: Classify the user's reply into exactly one of these labels:\n\
             - affirmation: the user accepts the proposed time\n\
             - rejection: the user declines it or wants a different time\n\
             - unclear: anything else, including unrelated messages\n\
             Rules:\n\
             - Reply with ONLY the label, lowercase, no punctuation, no prose, no JSON.\n\
             User reply: \"{user_prompt}\"",
            user_prompt = prompt
        ),
        "event_extraction" => format!(
            "You are a calendar event extraction engine.\n\
             Current date and time (UTC): {now}\n\
             User timezone: {timezone}\n\
             Task: From the user message below, extract:\n\
             - \"title\": the event title with extraneous scheduling words removed. For example:\n\
               - \"schedule a dentist appointment tomorrow at 3pm\" -> \"dentist appointment\"\n\
               - \"book lunch with Sam on Friday\" -> \"lunch with Sam\"\n\
             - \"start\": an RFC3339 datetime string with offset, in the user's timezone.\n\
             - \"duration_minutes\": the event length in minutes.\n\
             Rules:\n\
             - If the user gives a relative day (e.g. \"tomorrow\", \"next Monday\"), compute the concrete date from the current date/time in the user's timezone.\n\
             - If the user states no duration, use 60.\n\
             - If the title or the start time genuinely cannot be determined, set that field to null. Never invent a date the user did not imply.\n\
             - Output ONLY raw JSON, no prose, markdown, or code fences.\n\
             - The JSON shape must be exactly:\n\
             {{\"title\":\"<string>\",\"start\":\"<RFC3339 datetime>\",\"duration_minutes\":<integer>}}\n\
             with null in place of any value that cannot be determined.\n\
             User message: \"{user_prompt}\"",
            now = now.to_rfc3339(),
            timezone = timezone,
            user_prompt = prompt
        ),
        "summary_range" => format!(
            "You are a date range extraction engine for calendar questions.\n\
             Current date and time (UTC): {now}\n\
             User timezone: {timezone}\n\
             Task: Determine which date range the user message below is asking about.\n\
             Rules:\n\
             - Both dates are inclusive and in the user's timezone.\n\
             - \"last week\" means the previous Monday-to-Sunday calendar week; \"this week\" and \"next week\" likewise align to Monday.\n\
             - Months mean whole calendar months.\n\
             - If no range can be determined, set both fields to null.\n\
             - Output ONLY raw JSON, no prose, markdown, or code fences.\n\
             - The JSON shape must be exactly:\n\
             {{\"start_date\":\"YYYY-MM-DD\",\"end_date\":\"YYYY-MM-DD\"}}\n\
             with null in place of any value that cannot be determined.\n\
             User message: \"{user_prompt}\"",
            now = now.to_rfc3339(),
            timezone = timezone,
            user_prompt = prompt
        ),
        "meeting_summary" => format!(
            "You are a meeting summary writer.\n\
             Current date and time (UTC): {now}\n\
             Task: Given the structured list of calendar events below, write a short natural-language summary of the period.\n\
             Rules:\n\
             - Address the user in second person (\"you\").\n\
             - Say how many meetings there were and where most of the time went.\n\
             - Keep it to 2-4 sentences, plain text, no markdown, no lists, no JSON.\n\
             - Do NOT wrap the output in quotes.\n\
             Structured input:\n\
             {structured}",
            now = now.to_rfc3339(),
            structured = prompt
        ),
        "availability" => format!(
            "You are a calendar availability assistant.\n\
             Current date and time (UTC): {now}\n\
             User timezone: {timezone}\n\
             Task: Answer the user's question using ONLY the structured event list below.\n\
             Rules:\n\
             - Mention concrete times in the user's timezone.\n\
             - If the list is empty, say the user has nothing scheduled then.\n\
             - Keep it to 1-3 sentences, plain text, no markdown, no lists, no JSON.\n\
             Structured input:\n\
             {structured}",
            now = now.to_rfc3339(),
            timezone = timezone,
            structured = prompt
        ),
        _ => return Err("Not a valid base prompt".to_string().into()),
    };

    query_openai(full_prompt, prompt_type, api_key).await
}

async fn query_openai(
    prompt: String,
    prompt_type: &str,
    api_key: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let system_message = match prompt_type {
        "intent" | "response" => {
            "You are a strict label classifier. You read instructions and a message and reply ONLY with a single lowercase label from the allowed set, with no punctuation, no markdown, and no extra text."
        }
        "event_extraction" | "summary_range" => {
            "You are a strict JSON extraction engine. Reply ONLY with a single JSON object, with no markdown, no backticks, and no extra text. If the user gives an explicit date you preserve that exact date and only fill in missing parts according to the instructions."
        }
        "meeting_summary" | "availability" => {
            "You are a calendar assistant writer. Reply with plain text only (no JSON, no markdown, no quotes)."
        }
        _ => "You are a helpful assistant.",
    };

    let request: OpenAIRequest = OpenAIRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: system_message.to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt,
            },
        ],
        max_tokens: 1500,
        temperature: 0.2,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(ORACLE_TIMEOUT_SECS))
        .build()?;
    let response = client
        .post("https://api.openai.com/v1/chat/completions")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?; // read the body once

    if !status.is_success() {
        eprintln!("OpenAI error {}: {}", status, text);
        return Err(format!("Request failed with status {}", status).into());
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse JSON: {}\nRaw body: {}", e, text))?;

    if let Some(choice) = parsed.choices.first() {
        Ok(choice.message.content.clone())
    } else {
        eprintln!("No choices found in response.\nRaw body:\n{}", text);
        Err("No response from OpenAI".to_string().into())
    }
}
