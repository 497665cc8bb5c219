use crate::app::Action;
use crate::services::table_service::SortKey;

pub const HELP_TEXT: &str = "\
📖 coinboard commands

📊 Market table
  load [vs] [per_page]         Load top coins (per_page 1..250)
  filter <text>                Filter by id, name or symbol
  sort <column>                rank, id, symbol, name, price, market_cap, change_24h
  csv                          Show the CSV export link
  coins <prefix>               Suggest loaded coin ids

💱 Conversion
  convert <coin> <vs> <amount> Convert an amount, e.g. convert bitcoin usd 2
  price <coin> [vs]            Quick quote with 24h change

📈 Chart
  history [coin] [vs] [from] [to]   Dates as YYYY-MM-DD
  hover <x> <y>                Pointer over the chart (display pixels)
  leave                        Pointer left the chart

🎯 General
  theme                        Toggle light/dark
  help                         Show this message
  quit                         Exit";

/// What a line of input asks for
#[derive(Debug)]
pub enum Command {
    Empty,
    Quit,
    Run(Action),
}

/// Map one input line to an action; `Err` carries the usage hint
pub fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(Command::Empty);
    }

    let command = parts[0].to_lowercase();
    let args = &parts[1..];

    let action = match command.as_str() {
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        "help" | "?" => Action::Help,
        "load" | "top" => Action::LoadTop {
            vs: args.first().map(|s| s.to_string()),
            per_page: args
                .get(1)
                .map(|s| s.parse::<u32>())
                .transpose()
                .map_err(|_| "❌ per_page must be a whole number. Use: `load [vs] [per_page]`".to_string())?,
        },
        // Everything after the command is the filter, spaces included
        "filter" | "f" => Action::FilterInput(args.join(" ")),
        "sort" => {
            let key = args.first().ok_or("❌ Use: `sort <column>`".to_string())?;
            Action::SortBy(key.parse::<SortKey>()?)
        }
        "convert" | "cv" => match args {
            [coin_id, vs, amount] => Action::Convert {
                coin_id: coin_id.to_string(),
                vs: vs.to_string(),
                amount: amount.to_string(),
            },
            _ => return Err("❌ Use: `convert <coin> <vs> <amount>`".to_string()),
        },
        "price" | "p" => match args {
            [coin_id] => Action::Quote {
                coin_id: coin_id.to_string(),
                vs: None,
            },
            [coin_id, vs] => Action::Quote {
                coin_id: coin_id.to_string(),
                vs: Some(vs.to_string()),
            },
            _ => return Err("❌ Use: `price <coin> [vs]`".to_string()),
        },
        "history" | "chart" => {
            if args.len() > 4 {
                return Err("❌ Use: `history [coin] [vs] [from] [to]`".to_string());
            }
            let arg = |i: usize| args.get(i).map(|s| s.to_string());
            Action::History {
                coin_id: arg(0),
                vs: arg(1),
                from: arg(2),
                to: arg(3),
            }
        }
        "hover" => match args {
            [x, y] => {
                let x: f64 = x.parse().map_err(|_| format!("❌ Invalid x: '{}'", x))?;
                let y: f64 = y.parse().map_err(|_| format!("❌ Invalid y: '{}'", y))?;
                Action::PointerMove { x, y }
            }
            _ => return Err("❌ Use: `hover <x> <y>`".to_string()),
        },
        "leave" => Action::PointerLeave,
        "theme" => Action::ToggleTheme,
        "csv" => Action::ShowCsvLink,
        "coins" => Action::SuggestCoins(args.first().copied().unwrap_or_default().to_string()),
        other => return Err(format!("❓ Unknown command '{}'. Type `help` for the list.", other)),
    };

    Ok(Command::Run(action))
}
