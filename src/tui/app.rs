use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use ratatui::Terminal;
use tokio::runtime::Handle;

use crate::api::ConfigBackend;
use crate::core::PageController;
use crate::models::{ConfigRow, RowKey};

/// 输入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 浏览表格
    Normal,
    /// 编辑查询条件
    Filtering,
    /// 编辑当前行的值
    EditingValue,
    /// 填写创建表单
    Creating,
    /// 历史弹窗
    History,
}

const FILTER_LABELS: [&str; 2] = ["Key Category", "Key Name"];
const CREATE_LABELS: [&str; 3] = ["Key Category*", "Key Name*", "Key Value*"];

/// TUI 应用状态。后台调用在事件循环里同步等待，状态修改不会交错。
pub struct App<B> {
    controller: PageController<B>,
    runtime: Handle,
    running: bool,
    mode: Mode,
    /// 当前页内的光标
    cursor: usize,
    filter_field: usize,
    create_field: usize,
    edit_buffer: String,
}

impl<B: ConfigBackend> App<B> {
    pub fn new(controller: PageController<B>, runtime: Handle) -> Self {
        Self {
            controller,
            runtime,
            running: true,
            mode: Mode::Normal,
            cursor: 0,
            filter_field: 0,
            create_field: 0,
            edit_buffer: String::new(),
        }
    }

    pub fn controller(&self) -> &PageController<B> {
        &self.controller
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn edit_buffer(&self) -> &str {
        &self.edit_buffer
    }

    pub fn status_message(&self) -> &str {
        match self.controller.message() {
            "" => "Ready",
            msg => msg,
        }
    }

    fn current_row(&self) -> Option<&ConfigRow> {
        self.controller.page_rows().get(self.cursor)
    }

    fn current_key(&self) -> Option<RowKey> {
        self.current_row().map(ConfigRow::key)
    }

    /// 页面或行数变化后修正光标
    fn clamp_cursor(&mut self) {
        let len = self.controller.page_rows().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn search(&mut self) {
        let _ = self.runtime.block_on(self.controller.search());
        self.cursor = 0;
    }

    /// 启动 TUI 事件循环
    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    /// 处理键盘输入
    pub fn handle_key(&mut self, code: KeyCode) {
        match self.mode {
            Mode::Normal => self.handle_normal_key(code),
            Mode::Filtering => self.handle_filter_key(code),
            Mode::EditingValue => self.handle_edit_key(code),
            Mode::Creating => self.handle_create_key(code),
            Mode::History => self.handle_history_key(code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('/') => {
                self.filter_field = 0;
                self.mode = Mode::Filtering;
            }
            KeyCode::Char('r') => self.search(),
            KeyCode::Up => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
            }
            KeyCode::Down => {
                let len = self.controller.page_rows().len();
                if len > 0 && self.cursor < len - 1 {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(key) = self.current_key() {
                    self.controller.toggle_select(&key);
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => self.start_editing(),
            KeyCode::Char('s') => {
                if self.controller.rows().is_empty() {
                    self.controller.set_message("No rows loaded");
                    return;
                }
                let _ = self.runtime.block_on(self.controller.save());
                self.clamp_cursor();
            }
            KeyCode::Char('n') => {
                self.create_field = 0;
                self.mode = Mode::Creating;
            }
            KeyCode::Char('h') => {
                if let Some(key) = self.current_key() {
                    self.mode = Mode::History;
                    let _ = self.runtime.block_on(self.controller.open_history(key));
                }
            }
            KeyCode::Char('x') => {
                if self.controller.rows().is_empty() {
                    self.controller.set_message("No rows loaded");
                    return;
                }
                let _ = self.runtime.block_on(self.controller.download_excel());
            }
            KeyCode::Left => {
                self.controller.prev_page();
                self.cursor = 0;
            }
            KeyCode::Right => {
                self.controller.next_page();
                self.cursor = 0;
            }
            KeyCode::Home => {
                self.controller.first_page();
                self.cursor = 0;
            }
            KeyCode::End => {
                self.controller.last_page();
                self.cursor = 0;
            }
            KeyCode::Char('z') => {
                self.controller.cycle_page_size();
                self.cursor = 0;
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.search();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.filter_field = (self.filter_field + 1) % FILTER_LABELS.len();
            }
            KeyCode::Backspace => {
                self.filter_value_mut().pop();
            }
            KeyCode::Char(c) => self.filter_value_mut().push(c),
            _ => {}
        }
    }

    fn filter_value_mut(&mut self) -> &mut String {
        let filter = self.controller.filter_mut();
        match self.filter_field {
            0 => &mut filter.category,
            _ => &mut filter.config_name,
        }
    }

    /// 开始编辑当前行，初始内容为当前显示值
    fn start_editing(&mut self) {
        let value = match self.current_row() {
            Some(row) => self.controller.display_value(row),
            None => return,
        };
        self.edit_buffer = value;
        self.mode = Mode::EditingValue;
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.edit_buffer.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => {
                if let Some(key) = self.current_key() {
                    let value = std::mem::take(&mut self.edit_buffer);
                    self.controller.set_edited(&key, value);
                    if !self.controller.tracker().is_selected(&key) {
                        self.controller
                            .set_message("Edited. Press space to select the row, s to save");
                    }
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) => self.edit_buffer.push(c),
            _ => {}
        }
    }

    fn handle_create_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Tab => {
                self.create_field = (self.create_field + 1) % CREATE_LABELS.len();
            }
            KeyCode::BackTab => {
                self.create_field =
                    (self.create_field + CREATE_LABELS.len() - 1) % CREATE_LABELS.len();
            }
            KeyCode::Enter => {
                // 校验失败时停留在表单
                if self.runtime.block_on(self.controller.create()).is_ok() {
                    self.mode = Mode::Normal;
                    self.cursor = 0;
                }
            }
            KeyCode::Backspace => {
                self.create_value_mut().pop();
            }
            KeyCode::Char(c) => self.create_value_mut().push(c),
            _ => {}
        }
    }

    fn create_value_mut(&mut self) -> &mut String {
        let form = self.controller.create_form_mut();
        match self.create_field {
            0 => &mut form.category,
            1 => &mut form.config_name,
            _ => &mut form.config_value,
        }
    }

    fn handle_history_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
            self.controller.close_history();
            self.mode = Mode::Normal;
        }
    }

    /// 渲染整个界面
    pub fn render(&self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_title(frame, outer[0]);
        self.render_filters(frame, outer[1]);
        self.render_table(frame, outer[2]);
        self.render_pager(frame, outer[3]);
        self.render_status(frame, outer[4]);

        match self.mode {
            Mode::EditingValue => self.render_edit_popup(frame, outer[2]),
            Mode::Creating => self.render_create_popup(frame, outer[2]),
            Mode::History => self.render_history_popup(frame, area),
            _ => {}
        }
    }

    fn render_title(&self, frame: &mut ratatui::Frame, area: Rect) {
        let title = Paragraph::new("Admin System Configuration")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_filters(&self, frame: &mut ratatui::Frame, area: Rect) {
        let filter = self.controller.filter();
        let values = [filter.category.as_str(), filter.config_name.as_str()];
        let active = self.mode == Mode::Filtering;

        let mut spans = Vec::new();
        for (i, (label, value)) in FILTER_LABELS.iter().zip(values).enumerate() {
            let focused = active && i == self.filter_field;
            let label_style = if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!("{}: ", label), label_style));
            spans.push(Span::styled(value.to_string(), Style::default().fg(Color::White)));
            if focused {
                spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
            }
            spans.push(Span::raw("   "));
        }

        let border_style = if active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .title(" Search (/ to edit, Enter to search) ")
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        frame.render_widget(bar, area);
    }

    fn render_table(&self, frame: &mut ratatui::Frame, area: Rect) {
        let total = self.controller.rows().len();
        let title = if self.controller.is_loading() {
            " Searching... ".to_string()
        } else {
            format!(
                " Search Results: {} (selected: {}) ",
                total,
                self.controller.tracker().selected_count()
            )
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        let page_rows = self.controller.page_rows();
        if page_rows.is_empty() {
            let empty = Paragraph::new("No data available in table").block(block);
            frame.render_widget(empty, area);
            return;
        }

        let tracker = self.controller.tracker();
        let rows: Vec<Row> = page_rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let key = row.key();
                let checkbox = if tracker.is_selected(&key) { "[x]" } else { "[ ]" };
                let mut value = self.controller.display_value(row);
                if tracker.is_dirty(&key) {
                    value.push_str(" *");
                }
                let style = if i == self.cursor {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(checkbox),
                    Cell::from(row.category().to_string()),
                    Cell::from(row.config_name().to_string()),
                    Cell::from(value),
                ])
                .style(style)
            })
            .collect();

        let header = Row::new(vec!["", "Key Category", "Key Name", "Key Value"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Percentage(25),
                Constraint::Percentage(30),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(block);
        frame.render_widget(table, area);
    }

    fn render_pager(&self, frame: &mut ratatui::Frame, area: Rect) {
        let pager = self.controller.pager();
        let total = self.controller.rows().len();
        let arrow = |text: &'static str, enabled: bool| {
            let color = if enabled { Color::Cyan } else { Color::DarkGray };
            Span::styled(text, Style::default().fg(color))
        };
        let line = Line::from(vec![
            arrow(" ◀", !pager.is_first()),
            Span::raw(format!(
                " Page {} of {} ",
                pager.page(),
                self.controller.total_pages()
            )),
            arrow("▶", !pager.is_last(total)),
            Span::styled(
                format!("   Page size: {}", pager.page_size()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_status(&self, frame: &mut ratatui::Frame, area: Rect) {
        let status = Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.status_message(), Style::default().fg(Color::Green)),
            Span::raw(" | "),
            Span::styled(
                "q:Quit  /:Filter  r:Search  Space:Select  e:Edit  s:Save  n:New  h:History  x:Excel  ←→:Page  z:Size",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let bar = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
        frame.render_widget(bar, area);
    }

    fn render_edit_popup(&self, frame: &mut ratatui::Frame, area: Rect) {
        let popup = popup_area(area, 60, 7);
        let key = self.current_key();
        let title = key
            .as_ref()
            .map(|k| format!(" Edit {} / {} ", k.category, k.config_name))
            .unwrap_or_else(|| " Edit ".to_string());
        let original = key
            .as_ref()
            .and_then(|k| self.controller.tracker().record(k))
            .and_then(|r| r.original.clone())
            .unwrap_or_default();
        let lines = vec![
            Line::from(vec![
                Span::styled("Key Value: ", Style::default().fg(Color::Cyan)),
                Span::styled(self.edit_buffer.as_str(), Style::default().fg(Color::White)),
                Span::styled("█", Style::default().fg(Color::Cyan)),
            ]),
            Line::from(Span::styled(
                format!("Original:  {}", original),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "Enter=apply  Esc=cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
            popup,
        );
    }

    fn render_create_popup(&self, frame: &mut ratatui::Frame, area: Rect) {
        let popup = popup_area(area, 60, 9);
        let form = self.controller.create_form();
        let values = [
            form.category.as_str(),
            form.config_name.as_str(),
            form.config_value.as_str(),
        ];

        let mut lines: Vec<Line> = Vec::new();
        for (i, (label, value)) in CREATE_LABELS.iter().zip(values).enumerate() {
            let is_active = i == self.create_field;
            let indicator = if is_active { "▶ " } else { "  " };
            let label_style = if is_active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::raw(indicator),
                Span::styled(format!("{}: ", label), label_style),
                Span::styled(value, Style::default().fg(Color::White)),
                if is_active {
                    Span::styled("█", Style::default().fg(Color::Cyan))
                } else {
                    Span::raw("")
                },
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Tab=next field  Enter=submit  Esc=close",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(" Create Admin System Configuration ")
                    .borders(Borders::ALL),
            ),
            popup,
        );
    }

    fn render_history_popup(&self, frame: &mut ratatui::Frame, area: Rect) {
        let popup = popup_area(area, 90, area.height.saturating_sub(4));
        let history = self.controller.history();
        let block = Block::default()
            .title(format!(" Admin System History: {} (Esc to close) ", history.title))
            .borders(Borders::ALL);
        frame.render_widget(Clear, popup);

        if history.loading {
            frame.render_widget(Paragraph::new("Loading...").block(block), popup);
            return;
        }
        if history.rows.is_empty() {
            frame.render_widget(Paragraph::new("No history").block(block), popup);
            return;
        }

        let rows: Vec<Row> = history
            .rows
            .iter()
            .map(|h| {
                Row::new(vec![
                    h.category().to_string(),
                    h.config_name().to_string(),
                    h.config_value().to_string(),
                    h.action().to_string(),
                    h.updated_date().to_string(),
                    h.updated_by().to_string(),
                ])
            })
            .collect();
        let header = Row::new(vec![
            "Key Category",
            "Key Name",
            "Key Value",
            "Action",
            "Updated Date",
            "Updated By",
        ])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let table = Table::new(rows, [Constraint::Ratio(1, 6); 6])
            .header(header)
            .block(block);
        frame.render_widget(table, popup);
    }
}

/// 在 area 中居中取一块：宽度按百分比，高度按行数
fn popup_area(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
