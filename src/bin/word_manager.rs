use clap::{App, Arg, SubCommand};
use hangman_server::word_source::{self, WordSource};

fn main() {
    let matches = App::new("词表管理器")
        .version("1.0")
        .about("管理猜词游戏词表")
        .subcommand(SubCommand::with_name("list").about("列出所有单词"))
        .subcommand(
            SubCommand::with_name("add").about("添加新单词").arg(
                Arg::with_name("word")
                    .help("单词（小写字母）")
                    .required(true)
                    .index(1),
            ),
        )
        .subcommand(SubCommand::with_name("stats").about("显示词表统计信息"))
        .subcommand(SubCommand::with_name("validate").about("验证词表完整性"))
        .subcommand(SubCommand::with_name("pick").about("随机选取一个单词"))
        .get_matches();

    // 初始化配置
    if let Err(e) = hangman_server::config::Config::init() {
        eprintln!("配置初始化失败: {}", e);
        return;
    }
    let Some(config) = hangman_server::config::Config::get() else {
        eprintln!("配置未初始化");
        return;
    };
    let file_path = &config.word_list.file_path;

    // validate 需要在词表无效时也能运行
    if let Some(("validate", _)) = matches.subcommand() {
        match word_source::read_entries(file_path) {
            Ok(entries) => {
                let problems = word_source::validate_entries(&entries);
                if problems.is_empty() {
                    println!("词表验证通过！共 {} 个单词", entries.len());
                } else {
                    println!("词表验证发现 {} 个问题:", problems.len());
                    for problem in problems {
                        println!("  - {}", problem);
                    }
                }
            }
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    let mut words = match WordSource::load_from_file(file_path) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("加载词表失败: {}", e);
            return;
        }
    };

    match matches.subcommand() {
        Some(("list", _)) => {
            println!("词表 {} 共 {} 个单词:", file_path, words.len());
            for word in words.words() {
                println!("  {}", word);
            }
        }
        Some(("add", args)) => {
            let word = args.value_of("word").unwrap_or_default().to_lowercase();

            if let Err(e) = words.add_word(&word) {
                eprintln!("添加单词失败: {}", e);
            } else if let Err(e) = words.save_to_file(file_path) {
                eprintln!("保存词表失败: {}", e);
            } else {
                println!("成功添加单词: {}", word);
            }
        }
        Some(("stats", _)) => {
            let stats = words.stats();
            println!("词表统计信息:");
            println!("  总单词数: {}", stats.total_words);
            println!("  最短: {}  最长: {}", stats.shortest, stats.longest);
            println!("  长度分布:");
            for (length, count) in &stats.length_stats {
                println!("    {}: {}", length, count);
            }
        }
        Some(("pick", _)) => {
            println!("{}", words.pick_word());
        }
        _ => {
            println!("请使用 --help 查看可用命令");
        }
    }
}
